//! Human-readable determination certificate.

use std::fmt::Write as _;

use crate::closure::ClosureMode;
use crate::determination::DeterminationRecord;
use crate::gate::Gate;
use crate::vocab;

/// Bindings listed in the report before it says "more".
pub const REPORT_BINDING_CAP: usize = 8;

const RULE: &str = "============================================================";
const THIN: &str = "------------------------------------------------------------";

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}\n{THIN}");
}

fn yes(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Renders the certificate. Deterministic in the record.
#[must_use]
pub fn to_report(record: &DeterminationRecord) -> String {
    let system = record.system();
    let counts = record.counts();
    let c = record.classification();
    let g = record.gates();
    let e = record.evidence();
    let k = record.constraints();
    let meta = record.metadata();

    let mut out = String::with_capacity(8 * 1024);
    let _ = writeln!(out, "{RULE}\nARCO DETERMINATION CERTIFICATE\n{RULE}");
    let _ = writeln!(out, "System:           {}", system.short_name);
    let _ = writeln!(out, "IRI:              {}", system.iri);
    if let Some(label) = &system.label {
        let _ = writeln!(out, "Label:            {label}");
    }
    if let Some(profile) = &meta.profile {
        let _ = writeln!(out, "Profile:          {profile}");
    }
    let _ = writeln!(out, "Timestamp:        {}", meta.timestamp);
    let _ = writeln!(
        out,
        "Source revision:  {}",
        meta.source_revision.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(out, "Engine:           arco-engine {}", meta.engine_version);
    let _ = writeln!(
        out,
        "Closure:          {} ({}, {})",
        meta.closure_service,
        meta.closure_mode.as_str(),
        meta.strictness
    );
    if let Some(reason) = &meta.degraded_reason {
        let _ = writeln!(out, "Degraded because: {reason}");
    }
    let _ = writeln!(
        out,
        "Triples:          {} asserted, {} reasoned, {} added",
        counts.asserted, counts.reasoned, counts.added
    );

    section(&mut out, "CLASSIFICATION");
    let _ = writeln!(out, "{:<28}{} ({})", format!("{}:", c.label), yes(c.high_risk), c.mode);
    let _ = writeln!(out, "{:<28}{}", format!("{}:", c.narrow_label), yes(c.annex));
    let _ = writeln!(out, "{:<28}{}", "Commitment state:", record.state());
    let _ = writeln!(out, "{:<28}{}", "Justified:", yes(c.justified));
    if meta.closure_mode == ClosureMode::Degraded {
        let _ = writeln!(
            out,
            "Note: closure was not materialized; a negative outcome only means \"not asserted\"."
        );
    }

    section(&mut out, "GATES");
    for gate in Gate::ALL {
        let _ = writeln!(
            out,
            "  [{}] {}",
            if g.gate(gate) { "x" } else { " " },
            gate.as_str()
        );
    }
    let _ = writeln!(out, "  documentation signal: {}", yes(g.documentation));
    let _ = writeln!(out, "  capability signal:    {}", yes(g.capability_signal));

    section(&mut out, "MISSING COMMITMENTS");
    if record.missing_commitments().is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for missing in record.missing_commitments() {
        let _ = writeln!(out, "  - {missing}");
    }

    section(&mut out, "EVIDENCE PATHS");
    let _ = writeln!(out, "  Primary path present: {}", yes(e.primary_path_present()));
    for b in e.bindings.iter().take(REPORT_BINDING_CAP) {
        let _ = writeln!(
            out,
            "  {} --has_part--> {}",
            system.short_name,
            b.describe()
        );
    }
    let shown = e.bindings.len().min(REPORT_BINDING_CAP);
    if e.total_bindings > shown {
        let _ = writeln!(out, "  ... ({} more)", e.total_bindings - shown);
    }
    if !e.triggering_dispositions.is_empty() {
        let _ = writeln!(
            out,
            "  Triggering dispositions: {}",
            e.triggering_dispositions.join(", ")
        );
    }

    section(&mut out, "LEGACY PATH (diagnostic)");
    let _ = writeln!(
        out,
        "  {} --{}--> triggering capability: {}",
        system.short_name,
        vocab::relation_label(vocab::BEARER_OF),
        yes(!e.legacy_dispositions.is_empty())
    );
    for d in &e.legacy_dispositions {
        let _ = writeln!(out, "  disposition: {d}");
    }

    section(&mut out, "PROOF NEIGHBORHOOD");
    if e.proof_edges.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for edge in &e.proof_edges {
        let _ = writeln!(
            out,
            "  [{:<8}] {}",
            edge.provenance.as_str(),
            edge.triple.short_form()
        );
    }
    if e.proof_total > e.proof_edges.len() {
        let _ = writeln!(out, "  ... ({} more)", e.proof_total - e.proof_edges.len());
    }

    section(&mut out, "CONSTRAINTS");
    let _ = writeln!(
        out,
        "  {}: conforms {}, {} violation(s), {} result(s)",
        k.validator,
        yes(k.conforms),
        k.violation_count,
        k.result_count
    );
    if !k.conforms {
        for line in k.report_text.lines() {
            let _ = writeln!(out, "  | {line}");
        }
    }

    section(&mut out, "INCONSISTENCIES");
    if record.inconsistencies().is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for i in record.inconsistencies() {
        let _ = writeln!(out, "  {}: {}", i.code(), i.describe());
    }

    section(&mut out, "CHECKS");
    for check in &record.checks().results {
        let _ = writeln!(
            out,
            "  [{}] {:<15} {}",
            check.severity.label(),
            check.check,
            check.message
        );
        for detail in &check.details {
            let _ = writeln!(out, "         {detail}");
        }
    }

    let _ = writeln!(out, "\n{RULE}");
    if record.all_checks_passed() {
        let _ = writeln!(out, "ALL CHECKS PASSED");
        if c.mode == crate::determination::ClassificationMode::Inferred {
            let _ = writeln!(
                out,
                "{} was inferred by the reasoner (not asserted).",
                c.label
            );
        }
    } else {
        let _ = writeln!(
            out,
            "SOME CHECKS FAILED ({} failure(s))",
            record.checks().failure_count()
        );
    }
    let _ = writeln!(out, "{RULE}");
    out
}
