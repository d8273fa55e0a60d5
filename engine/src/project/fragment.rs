//! Annotated fact fragment projector (Turtle).
//!
//! The fragment describes one freshly minted determination node. It links
//! to the system but never makes the system a subject, and the only
//! `rdf:type` it states is `arco:RegulatoryDetermination`.

use std::fmt::Write as _;

use crate::determination::DeterminationRecord;
use crate::graph::{escape_literal, Term};

/// Bindings listed in the fragment before the narrative says "more".
pub const FRAGMENT_BINDING_CAP: usize = 5;

/// Local name of the minted determination node.
#[must_use]
pub fn determination_id(record: &DeterminationRecord) -> String {
    let system: String = record
        .system()
        .short_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let stamp: String = record
        .metadata()
        .timestamp
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    format!("Determination_{system}_{stamp}")
}

fn turtle_string(value: &str) -> String {
    format!("\"{}\"", escape_literal(value))
}

fn boolean(value: bool) -> String {
    format!("\"{value}\"^^xsd:boolean")
}

fn node(term: &Term) -> String {
    match term {
        Term::Iri(iri) => format!("<{iri}>"),
        other => other.to_string(),
    }
}

/// The gate statuses, rationale and missing commitments as prose lines.
#[must_use]
pub fn narrative(record: &DeterminationRecord) -> Vec<String> {
    let c = record.classification();
    let g = record.gates();
    let e = record.evidence();
    let mark = |b: bool| if b { "satisfied" } else { "not satisfied" };

    let mut lines = vec![
        format!(
            "Determination for {}: commitment state {}.",
            record.system().short_name,
            record.state()
        ),
        format!(
            "{} {} ({}); {} {}.",
            c.label,
            if c.high_risk { "holds" } else { "does not hold" },
            c.mode,
            c.narrow_label,
            if c.annex { "holds" } else { "does not hold" },
        ),
        format!("Gate capability: {}.", mark(g.capability)),
        format!("Gate intended_use: {}.", mark(g.intended_use)),
        format!("Gate use_scenario: {}.", mark(g.use_scenario)),
    ];
    if e.primary_path_present() {
        let shown: Vec<String> = e
            .bindings
            .iter()
            .take(FRAGMENT_BINDING_CAP)
            .map(|b| b.describe())
            .collect();
        let mut line = format!("Evidence: {}", shown.join("; "));
        if e.total_bindings > shown.len() {
            let _ = write!(line, " (+{} more)", e.total_bindings - shown.len());
        }
        line.push('.');
        lines.push(line);
    } else {
        lines.push("Evidence: no component bears a triggering capability.".to_owned());
    }
    for missing in record.missing_commitments() {
        lines.push(format!("Missing: {missing}."));
    }
    for inconsistency in record.inconsistencies() {
        lines.push(format!(
            "Inconsistency {}: {}.",
            inconsistency.code(),
            inconsistency.describe()
        ));
    }
    lines.push(format!(
        "Constraints: {} ({} violation(s)). All checks passed: {}.",
        if record.constraints().conforms { "conform" } else { "do not conform" },
        record.constraints().violation_count,
        record.all_checks_passed()
    ));
    lines
}

/// Renders the annotated fragment.
#[must_use]
pub fn to_annotated_fragment(record: &DeterminationRecord) -> String {
    let c = record.classification();
    let g = record.gates();
    let e = record.evidence();
    let meta = record.metadata();

    let mut out = String::with_capacity(4 * 1024);
    out.push_str("@prefix arco: <https://arco.ai/ontology/core#> .\n");
    out.push_str("@prefix prov: <http://www.w3.org/ns/prov#> .\n");
    out.push_str("@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n");
    out.push_str("@prefix xsd:  <http://www.w3.org/2001/XMLSchema#> .\n\n");

    let mut props: Vec<String> = vec![
        "a arco:RegulatoryDetermination".to_owned(),
        format!("arco:determinationOf <{}>", record.system().iri),
        format!("arco:commitmentState {}", turtle_string(record.state().as_str())),
        format!("arco:classificationLabel {}", turtle_string(&c.label)),
        format!("arco:classificationMode {}", turtle_string(c.mode.as_str())),
        format!("arco:highRiskEntailed {}", boolean(c.high_risk)),
        format!("arco:annexEntailed {}", boolean(c.annex)),
        format!("arco:classificationJustified {}", boolean(c.justified)),
        format!("arco:capabilityGate {}", boolean(g.capability)),
        format!("arco:intendedUseGate {}", boolean(g.intended_use)),
        format!("arco:useScenarioGate {}", boolean(g.use_scenario)),
        format!("arco:documentationSignal {}", boolean(g.documentation)),
        format!("arco:constraintsConform {}", boolean(record.constraints().conforms)),
        format!(
            "arco:violationCount \"{}\"^^xsd:integer",
            record.constraints().violation_count
        ),
        format!("arco:allChecksPassed {}", boolean(record.all_checks_passed())),
        format!("arco:closureMode {}", turtle_string(meta.closure_mode.as_str())),
    ];
    for missing in record.missing_commitments() {
        props.push(format!("arco:missingCommitment {}", turtle_string(missing)));
    }
    for b in e.bindings.iter().take(FRAGMENT_BINDING_CAP) {
        let capability = b
            .capability
            .as_ref()
            .map(|c| format!(" ; arco:capabilityClass {}", node(c)))
            .unwrap_or_default();
        props.push(format!(
            "arco:evidenceBinding [ arco:component {} ; arco:disposition {}{capability} ]",
            node(&b.component),
            node(&b.disposition)
        ));
    }
    for inconsistency in record.inconsistencies() {
        props.push(format!("arco:inconsistency {}", turtle_string(inconsistency.code())));
    }
    if let Some(revision) = &meta.source_revision {
        props.push(format!("arco:sourceRevision {}", turtle_string(revision)));
    }
    props.push(format!(
        "prov:generatedAtTime \"{}\"^^xsd:dateTime",
        escape_literal(&meta.timestamp)
    ));
    props.push(format!(
        "rdfs:comment {}",
        turtle_string(&narrative(record).join("\n"))
    ));

    let _ = writeln!(out, "arco:{}", determination_id(record));
    let last = props.len().saturating_sub(1);
    for (i, prop) in props.iter().enumerate() {
        let end = if i == last { " ." } else { " ;" };
        let _ = writeln!(out, "    {prop}{end}");
    }
    out
}
