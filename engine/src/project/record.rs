//! Machine-readable record projector.

use serde_json::{json, Value};

use crate::check::Severity;
use crate::determination::DeterminationRecord;
use crate::graph::Term;
use crate::vocab;

/// Renders the record as pretty-printed JSON with sorted keys.
///
/// Total and deterministic: the same record always yields the same bytes.
#[must_use]
pub fn to_record(record: &DeterminationRecord) -> String {
    format!("{:#}\n", to_value(record))
}

/// The record as a JSON value.
#[must_use]
pub fn to_value(record: &DeterminationRecord) -> Value {
    let system = record.system();
    let counts = record.counts();
    let classification = record.classification();
    let gates = record.gates();
    let evidence = record.evidence();
    let constraints = record.constraints();
    let meta = record.metadata();

    let bindings: Vec<Value> = evidence
        .bindings
        .iter()
        .map(|b| {
            json!({
                "component": term_text(&b.component),
                "component_name": b.component.short_name(),
                "disposition": term_text(&b.disposition),
                "disposition_name": b.disposition.short_name(),
                "capability": b.capability.as_ref().map(term_text),
                "capability_name": b.capability.as_ref().map(Term::short_name),
            })
        })
        .collect();

    let proof_edges: Vec<Value> = evidence
        .proof_edges
        .iter()
        .map(|e| {
            let relation = e
                .triple
                .predicate
                .as_iri()
                .map(vocab::relation_label)
                .unwrap_or_default();
            json!({
                "subject": e.triple.subject.short_name(),
                "relation": relation,
                "object": e.triple.object.short_name(),
                "provenance": e.provenance.as_str(),
            })
        })
        .collect();

    let inconsistencies: Vec<Value> = record
        .inconsistencies()
        .iter()
        .map(|i| json!({ "code": i.code(), "description": i.describe() }))
        .collect();

    let checks: Vec<Value> = record
        .checks()
        .results
        .iter()
        .map(|c| {
            let severity = match c.severity {
                Severity::Pass => "pass",
                Severity::Warning => "warning",
                Severity::Failure => "failure",
            };
            json!({
                "check": c.check,
                "severity": severity,
                "message": c.message,
                "details": c.details,
            })
        })
        .collect();

    json!({
        "system": {
            "iri": system.iri,
            "short_name": system.short_name,
            "label": system.label,
        },
        "triple_counts": {
            "asserted": counts.asserted,
            "reasoned": counts.reasoned,
            "added": counts.added,
        },
        "classification": {
            "label": classification.label,
            "high_risk": classification.high_risk,
            "narrow_label": classification.narrow_label,
            "annex": classification.annex,
            "mode": classification.mode.as_str(),
            "justified": classification.justified,
        },
        "commitment_state": record.state().as_str(),
        "gates": {
            "capability": gates.capability,
            "intended_use": gates.intended_use,
            "use_scenario": gates.use_scenario,
            "documentation": gates.documentation,
            "capability_signal": gates.capability_signal,
        },
        "missing_commitments": record.missing_commitments(),
        "evidence": {
            "primary_path_present": evidence.primary_path_present(),
            "bindings": bindings,
            "total_bindings": evidence.total_bindings,
            "cap": evidence.cap,
            "triggering_dispositions": evidence.triggering_dispositions,
            "legacy_path_present": !evidence.legacy_dispositions.is_empty(),
            "legacy_dispositions": evidence.legacy_dispositions,
            "proof_neighborhood": {
                "edges": proof_edges,
                "total": evidence.proof_total,
            },
        },
        "constraints": {
            "validator": constraints.validator,
            "conforms": constraints.conforms,
            "violation_count": constraints.violation_count,
            "result_count": constraints.result_count,
            "violations": constraints.violations,
            "report": constraints.report_text,
        },
        "inconsistencies": inconsistencies,
        "checks": checks,
        "all_checks_passed": record.all_checks_passed(),
        "metadata": {
            "timestamp": meta.timestamp,
            "source_revision": meta.source_revision,
            "profile": meta.profile,
            "sources": meta.sources,
            "shapes": meta.shapes,
            "closure": {
                "service": meta.closure_service,
                "mode": meta.closure_mode.as_str(),
                "strictness": meta.strictness.as_str(),
                "degraded_reason": meta.degraded_reason,
            },
            "engine_version": meta.engine_version,
        },
    })
}

/// Bare IRI for named nodes, N-Triples for anything else.
fn term_text(term: &Term) -> String {
    match term.as_iri() {
        Some(iri) => iri.to_owned(),
        None => term.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::{ClosureMode, ClosureOutcome, Strictness};
    use crate::constraint::ConstraintOutcome;
    use crate::determination::{DeterminationInputs, SystemIdentity};
    use crate::evidence::{Evidence, EvidenceBinding, ProofNeighborhood};
    use crate::gate::{GateEvaluation, GateSignals};

    fn record_with(binding: EvidenceBinding) -> DeterminationRecord {
        let signals = GateSignals {
            high_risk_entailed: true,
            capability: true,
            capability_signal: true,
            ..GateSignals::default()
        };
        DeterminationRecord::build(DeterminationInputs {
            system: SystemIdentity::new("https://arco.ai/ontology/core#Sys", None),
            closure: ClosureOutcome {
                service: "owl-rl".to_owned(),
                mode: ClosureMode::Materialized,
                strictness: Strictness::Strict,
                asserted_triples: 3,
                reasoned_triples: 5,
                added_triples: 2,
                degraded_reason: None,
            },
            constraints: (
                "shacl-core".to_owned(),
                ConstraintOutcome {
                    conforms: true,
                    violation_count: 0,
                    report_text: "Validation Report\n".to_owned(),
                    results: Vec::new(),
                },
            ),
            evidence: Evidence {
                bindings: vec![binding],
                total_bindings: 1,
                legacy_dispositions: Vec::new(),
            },
            evidence_cap: 20,
            neighborhood: ProofNeighborhood::default(),
            gates: GateEvaluation {
                signals,
                state: signals.commitment_state(),
                missing_commitments: signals.missing_commitments(),
            },
            high_risk_asserted: false,
            timestamp: "2026-01-02T03:04:05Z".to_owned(),
            source_revision: None,
            profile: None,
            sources: vec!["facts.ttl".to_owned()],
            shapes: "shapes.ttl".to_owned(),
        })
    }

    #[test]
    fn blank_binding_terms_keep_their_node_form() {
        let record = record_with(EvidenceBinding {
            component: Term::blank("s0_cam"),
            disposition: Term::blank("s0_see"),
            capability: None,
        });
        let value = to_value(&record);
        let binding = &value["evidence"]["bindings"][0];
        assert_eq!(binding["component"], "_:s0_cam");
        assert_eq!(binding["disposition"], "_:s0_see");
        assert!(binding["capability"].is_null());
    }

    #[test]
    fn named_binding_terms_are_bare_iris() {
        let record = record_with(EvidenceBinding {
            component: Term::iri("https://arco.ai/ontology/core#Cam"),
            disposition: Term::iri("https://arco.ai/ontology/core#See"),
            capability: Some(Term::iri(vocab::BIOMETRIC_CAPABILITY)),
        });
        let value = to_value(&record);
        let binding = &value["evidence"]["bindings"][0];
        assert_eq!(binding["component"], "https://arco.ai/ontology/core#Cam");
        assert_eq!(binding["capability"], vocab::BIOMETRIC_CAPABILITY);
        assert_eq!(binding["capability_name"], "BiometricIdentificationCapability");
    }
}
