//! Determination Builder.
//!
//! [`DeterminationRecord::build`] is pure aggregation of the stage outputs.
//! The record is immutable once built and is the only input the projectors
//! read.

use std::fmt;

use crate::check::{CheckReport, CheckResult};
use crate::closure::{ClosureMode, ClosureOutcome, Strictness};
use crate::constraint::{ConstraintOutcome, ResultSeverity};
use crate::error::{EngineError, Result};
use crate::evidence::{Evidence, EvidenceBinding, ProofEdge, ProofNeighborhood};
use crate::gate::{CommitmentState, GateEvaluation, GateSignals};
use crate::vocab;

/// How the top-level classification came to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationMode {
    /// Present only after closure.
    Inferred,
    /// Present in the source data.
    Asserted,
    /// Absent after closure.
    NotPresent,
}

impl ClassificationMode {
    /// Upper-case wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationMode::Inferred => "INFERRED",
            ClassificationMode::Asserted => "ASSERTED",
            ClassificationMode::NotPresent => "NOT_PRESENT",
        }
    }

    fn derive(high_risk_entailed: bool, high_risk_asserted: bool) -> Self {
        match (high_risk_entailed, high_risk_asserted) {
            (false, _) => ClassificationMode::NotPresent,
            (true, true) => ClassificationMode::Asserted,
            (true, false) => ClassificationMode::Inferred,
        }
    }
}

impl fmt::Display for ClassificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The system under evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemIdentity {
    /// Full IRI.
    pub iri: String,
    /// Local name.
    pub short_name: String,
    /// `rdfs:label` from the Asserted Graph.
    pub label: Option<String>,
}

impl SystemIdentity {
    /// Builds an identity from an IRI and optional label.
    pub fn new(iri: impl Into<String>, label: Option<String>) -> Self {
        let iri = iri.into();
        let short_name = vocab::short_name(&iri).to_owned();
        Self {
            iri,
            short_name,
            label,
        }
    }
}

/// Graph sizes around closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripleCounts {
    /// Asserted Graph size.
    pub asserted: usize,
    /// Reasoned Graph size.
    pub reasoned: usize,
    /// Triples added by closure.
    pub added: usize,
}

/// The classification verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationSummary {
    /// Short name of the top-level class.
    pub label: String,
    /// Short name of the narrow class.
    pub narrow_label: String,
    /// Top-level classification holds after closure.
    pub high_risk: bool,
    /// Narrow classification holds after closure.
    pub annex: bool,
    /// How the top-level classification came to hold.
    pub mode: ClassificationMode,
    /// Classification holds and a binding supports it.
    pub justified: bool,
}

/// A disagreement between the classification and its evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// A classification holds but no evidence binding exists.
    EntailmentWithoutEvidence {
        /// System IRI.
        system: String,
    },
}

impl Inconsistency {
    /// Stable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Inconsistency::EntailmentWithoutEvidence { .. } => "entailment_without_evidence",
        }
    }

    /// One-line description.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Inconsistency::EntailmentWithoutEvidence { system } => format!(
                "{} is classified but no component --has_disposition--> triggering capability binding supports it",
                vocab::short_name(system)
            ),
        }
    }
}

/// Constraint stage result as carried in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSummary {
    /// Validator name.
    pub validator: String,
    /// Conformance.
    pub conforms: bool,
    /// Violation-severity results.
    pub violation_count: usize,
    /// All results, any severity.
    pub result_count: usize,
    /// Verbatim validator report.
    pub report_text: String,
    /// One line per violation-severity result.
    pub violations: Vec<String>,
}

impl ConstraintSummary {
    fn new(validator: &str, outcome: ConstraintOutcome) -> Self {
        let violations = outcome
            .results
            .iter()
            .filter(|r| r.severity == ResultSeverity::Violation)
            .map(|r| format!("{}: {}", r.focus_node.short_name(), r.message))
            .collect();
        Self {
            validator: validator.to_owned(),
            conforms: outcome.conforms,
            violation_count: outcome.violation_count,
            result_count: outcome.results.len(),
            report_text: outcome.report_text,
            violations,
        }
    }
}

/// Evidence as carried in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceSummary {
    /// Ordered, capped bindings.
    pub bindings: Vec<EvidenceBinding>,
    /// Bindings before the cap.
    pub total_bindings: usize,
    /// Cap applied.
    pub cap: usize,
    /// Legacy bearer-path dispositions (diagnostic).
    pub legacy_dispositions: Vec<String>,
    /// Unique bound disposition short names.
    pub triggering_dispositions: Vec<String>,
    /// Proof neighborhood edges.
    pub proof_edges: Vec<ProofEdge>,
    /// Proof edges before the cap.
    pub proof_total: usize,
}

impl EvidenceSummary {
    /// True if a binding exists.
    #[must_use]
    pub fn primary_path_present(&self) -> bool {
        self.total_bindings > 0
    }
}

/// Run metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    /// Run timestamp, RFC 3339.
    pub timestamp: String,
    /// Optional source revision hash.
    pub source_revision: Option<String>,
    /// Profile name, if one was used.
    pub profile: Option<String>,
    /// Fact source names.
    pub sources: Vec<String>,
    /// Shapes source name.
    pub shapes: String,
    /// Closure service name.
    pub closure_service: String,
    /// Materialized or degraded.
    pub closure_mode: ClosureMode,
    /// Strictness in force.
    pub strictness: Strictness,
    /// Why closure degraded.
    pub degraded_reason: Option<String>,
    /// Engine version.
    pub engine_version: String,
}

/// Everything the builder aggregates.
#[derive(Debug, Clone)]
pub struct DeterminationInputs {
    /// The system.
    pub system: SystemIdentity,
    /// Closure stage output.
    pub closure: ClosureOutcome,
    /// Constraint stage output and validator name.
    pub constraints: (String, ConstraintOutcome),
    /// Evidence Extractor output.
    pub evidence: Evidence,
    /// Evidence cap used.
    pub evidence_cap: usize,
    /// Proof neighborhood.
    pub neighborhood: ProofNeighborhood,
    /// Gate Evaluator output.
    pub gates: GateEvaluation,
    /// Top-level classification stated in the Asserted Graph.
    pub high_risk_asserted: bool,
    /// Run identification, apart from the closure fields.
    pub timestamp: String,
    /// Optional source revision.
    pub source_revision: Option<String>,
    /// Profile name.
    pub profile: Option<String>,
    /// Fact source names.
    pub sources: Vec<String>,
    /// Shapes source name.
    pub shapes: String,
}

/// The immutable result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminationRecord {
    system: SystemIdentity,
    counts: TripleCounts,
    classification: ClassificationSummary,
    gates: GateSignals,
    state: CommitmentState,
    missing_commitments: Vec<String>,
    evidence: EvidenceSummary,
    constraints: ConstraintSummary,
    inconsistencies: Vec<Inconsistency>,
    checks: CheckReport,
    metadata: RunMetadata,
}

impl DeterminationRecord {
    /// Aggregates stage outputs. No I/O.
    #[must_use]
    pub fn build(inputs: DeterminationInputs) -> Self {
        let DeterminationInputs {
            system,
            closure,
            constraints: (validator, constraint_outcome),
            evidence,
            evidence_cap,
            neighborhood,
            gates,
            high_risk_asserted,
            timestamp,
            source_revision,
            profile,
            sources,
            shapes,
        } = inputs;

        let signals = gates.signals;
        let classified = signals.high_risk_entailed || signals.annex_entailed;
        let mut inconsistencies = Vec::new();
        if classified && !evidence.primary_path_present() {
            inconsistencies.push(Inconsistency::EntailmentWithoutEvidence {
                system: system.iri.clone(),
            });
        }
        let classification = ClassificationSummary {
            label: vocab::short_name(vocab::HIGH_RISK_SYSTEM).to_owned(),
            narrow_label: vocab::short_name(vocab::ANNEX_III_1A_SYSTEM).to_owned(),
            high_risk: signals.high_risk_entailed,
            annex: signals.annex_entailed,
            mode: ClassificationMode::derive(signals.high_risk_entailed, high_risk_asserted),
            justified: classified && inconsistencies.is_empty(),
        };

        let evidence = EvidenceSummary {
            triggering_dispositions: evidence.triggering_dispositions(),
            legacy_dispositions: evidence
                .legacy_dispositions
                .iter()
                .map(|d| d.short_name())
                .collect(),
            bindings: evidence.bindings,
            total_bindings: evidence.total_bindings,
            cap: evidence_cap,
            proof_edges: neighborhood.edges,
            proof_total: neighborhood.total_edges,
        };
        let constraints = ConstraintSummary::new(&validator, constraint_outcome);
        let counts = TripleCounts {
            asserted: closure.asserted_triples,
            reasoned: closure.reasoned_triples,
            added: closure.added_triples,
        };
        let metadata = RunMetadata {
            timestamp,
            source_revision,
            profile,
            sources,
            shapes,
            closure_service: closure.service,
            closure_mode: closure.mode,
            strictness: closure.strictness,
            degraded_reason: closure.degraded_reason,
            engine_version: env!("CARGO_PKG_VERSION").to_owned(),
        };

        let checks = build_checks(
            &classification,
            gates.state,
            &gates.missing_commitments,
            signals.documentation,
            &evidence,
            &constraints,
            &inconsistencies,
            &metadata,
        );

        Self {
            system,
            counts,
            classification,
            gates: signals,
            state: gates.state,
            missing_commitments: gates.missing_commitments,
            evidence,
            constraints,
            inconsistencies,
            checks,
            metadata,
        }
    }

    /// The system under evaluation.
    #[must_use]
    pub fn system(&self) -> &SystemIdentity {
        &self.system
    }

    /// Triple counts.
    #[must_use]
    pub fn counts(&self) -> TripleCounts {
        self.counts
    }

    /// Classification verdict.
    #[must_use]
    pub fn classification(&self) -> &ClassificationSummary {
        &self.classification
    }

    /// Gate signals.
    #[must_use]
    pub fn gates(&self) -> &GateSignals {
        &self.gates
    }

    /// Commitment state.
    #[must_use]
    pub fn state(&self) -> CommitmentState {
        self.state
    }

    /// Unsatisfied gate lines.
    #[must_use]
    pub fn missing_commitments(&self) -> &[String] {
        &self.missing_commitments
    }

    /// Evidence.
    #[must_use]
    pub fn evidence(&self) -> &EvidenceSummary {
        &self.evidence
    }

    /// Constraint result.
    #[must_use]
    pub fn constraints(&self) -> &ConstraintSummary {
        &self.constraints
    }

    /// Detected inconsistencies.
    #[must_use]
    pub fn inconsistencies(&self) -> &[Inconsistency] {
        &self.inconsistencies
    }

    /// Check list.
    #[must_use]
    pub fn checks(&self) -> &CheckReport {
        &self.checks
    }

    /// Run metadata.
    #[must_use]
    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    /// True if no check failed.
    #[must_use]
    pub fn all_checks_passed(&self) -> bool {
        self.checks.all_passed()
    }

    /// Converts an `entailment_without_evidence` inconsistency into an error.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnjustifiedClassification`] when the classification
    /// holds without a supporting binding.
    pub fn ensure_justified(&self) -> Result<()> {
        match self.inconsistencies.first() {
            Some(Inconsistency::EntailmentWithoutEvidence { system }) => {
                Err(EngineError::UnjustifiedClassification {
                    system: system.clone(),
                })
            }
            None => Ok(()),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_checks(
    classification: &ClassificationSummary,
    state: CommitmentState,
    missing: &[String],
    documentation: bool,
    evidence: &EvidenceSummary,
    constraints: &ConstraintSummary,
    inconsistencies: &[Inconsistency],
    metadata: &RunMetadata,
) -> CheckReport {
    let mut report = CheckReport::new();

    report.push(match metadata.closure_mode {
        ClosureMode::Materialized => CheckResult::pass(
            "closure",
            format!("closure materialized by {}", metadata.closure_service),
        ),
        ClosureMode::Degraded => CheckResult::warn(
            "closure",
            "closure degraded: results reflect asserted facts only",
        )
        .with_details(metadata.degraded_reason.iter().cloned().collect()),
    });

    report.push(if constraints.conforms {
        CheckResult::pass("constraints", "data graph conforms to the shapes")
    } else {
        CheckResult::fail(
            "constraints",
            format!("{} constraint violation(s)", constraints.violation_count),
        )
        .with_details(constraints.violations.clone())
    });

    report.push(match (state, classification.justified) {
        (CommitmentState::Entailed, true) => CheckResult::pass(
            "classification",
            format!(
                "{} {} with {} evidence binding(s)",
                classification.label,
                classification.mode,
                evidence.total_bindings
            ),
        ),
        (CommitmentState::Entailed, false) => {
            CheckResult::fail("classification", "classification holds but is unjustified")
        }
        (CommitmentState::Underdetermined, _) => CheckResult::fail(
            "classification",
            "classification underdetermined: partial commitments do not close the pattern",
        )
        .with_details(missing.to_vec()),
        (CommitmentState::NotEntailed, _) => CheckResult::fail(
            "classification",
            format!("{} does not apply: no commitments found", classification.label),
        ),
    });

    report.push(if inconsistencies.is_empty() {
        CheckResult::pass("evidence", "classification and evidence are consistent")
    } else {
        CheckResult::fail(
            "evidence",
            inconsistencies
                .iter()
                .map(Inconsistency::code)
                .collect::<Vec<_>>()
                .join(", "),
        )
        .with_details(inconsistencies.iter().map(Inconsistency::describe).collect())
    });

    report.push(if documentation {
        CheckResult::pass("documentation", "assessment documentation is about the system")
    } else {
        CheckResult::warn("documentation", "no assessment documentation is about the system")
    });

    report
}
