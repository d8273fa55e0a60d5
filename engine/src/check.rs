//! Determination check list: results, severity levels, and aggregation.

/// Severity level of a check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The check passed.
    Pass,
    /// The check identified a warning (non-blocking).
    Warning,
    /// The check failed (blocks `all_checks_passed`).
    Failure,
}

impl Severity {
    /// Upper-case label used in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Severity::Pass => "PASS",
            Severity::Warning => "WARN",
            Severity::Failure => "FAIL",
        }
    }
}

/// A single check result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Short identifier of the check, e.g. `constraints`.
    pub check: String,
    /// Human-readable outcome.
    pub message: String,
    /// Severity of the result.
    pub severity: Severity,
    /// Additional detail lines.
    pub details: Vec<String>,
}

impl CheckResult {
    fn new(check: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            check: check.into(),
            message: message.into(),
            severity,
            details: Vec::new(),
        }
    }

    /// Creates a passing result.
    pub fn pass(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(check, message, Severity::Pass)
    }

    /// Creates a failure result.
    pub fn fail(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(check, message, Severity::Failure)
    }

    /// Creates a warning result.
    pub fn warn(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(check, message, Severity::Warning)
    }

    /// Attaches detail lines.
    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Returns true if this result represents a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }
}

/// Aggregated checks of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// All results in the order they were added.
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result.
    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    /// Count of failed checks.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Count of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .count()
    }

    /// True if no check failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_fail_the_report() {
        let mut report = CheckReport::new();
        report.push(CheckResult::pass("constraints", "conforms"));
        report.push(CheckResult::warn("documentation", "none found"));
        assert!(report.all_passed());
        assert_eq!(report.warning_count(), 1);
        report.push(CheckResult::fail("evidence", "missing").with_details(vec!["x".into()]));
        assert!(!report.all_passed());
        assert_eq!(report.failure_count(), 1);
    }
}
