//! Artifact projectors: determinism, fragment hygiene and file output.

use arco_engine::graph::store::parse_into;
use arco_engine::{fixtures, vocab};
use arco_engine::{
    run_determination, to_annotated_fragment, to_record, to_report, write_artifacts,
    ArtifactPaths, DeterminationRecord, Engines, Graph, ReasonerKind, RunConfig, Term,
};

fn sentinel() -> DeterminationRecord {
    let config = RunConfig::new(
        fixtures::SENTINEL_SYSTEM,
        fixtures::sentinel_sources(),
        fixtures::shapes(),
        "2026-03-01T12:00:00Z",
    )
    .with_source_revision(Some("abc123".to_owned()));
    run_determination(&config, &Engines::builtin(ReasonerKind::OwlRl)).unwrap()
}

fn helpdesk() -> DeterminationRecord {
    let config = RunConfig::new(
        fixtures::HELPDESK_SYSTEM,
        fixtures::helpdesk_sources(),
        fixtures::shapes(),
        "2026-03-01T12:00:00Z",
    );
    run_determination(&config, &Engines::builtin(ReasonerKind::OwlRl)).unwrap()
}

#[test]
fn projections_are_byte_identical() {
    let record = sentinel();
    assert_eq!(to_record(&record), to_record(&record));
    assert_eq!(to_report(&record), to_report(&record));
    assert_eq!(to_annotated_fragment(&record), to_annotated_fragment(&record));

    // Two independent runs on the same inputs agree too.
    assert_eq!(to_record(&record), to_record(&sentinel()));
}

#[test]
fn record_carries_the_verdict() {
    let value: serde_json::Value = serde_json::from_str(&to_record(&sentinel())).unwrap();
    assert_eq!(value["commitment_state"], "ENTAILED");
    assert_eq!(value["classification"]["mode"], "INFERRED");
    assert_eq!(value["evidence"]["total_bindings"], 1);
    assert_eq!(value["all_checks_passed"], true);
    assert_eq!(value["metadata"]["source_revision"], "abc123");
    assert_eq!(value["metadata"]["closure"]["strictness"], "strict");
    assert!(value["evidence"]["proof_neighborhood"]["edges"]
        .as_array()
        .is_some_and(|edges| !edges.is_empty()));
}

#[test]
fn fragment_states_no_domain_facts() {
    for record in [sentinel(), helpdesk()] {
        let text = to_annotated_fragment(&record);
        let mut graph = Graph::new();
        parse_into(&mut graph, "fragment.ttl", &text, 0).unwrap();

        let system = Term::iri(record.system().iri.as_str());
        assert!(graph.matching(Some(&system), None, None).next().is_none());

        let ty = Term::iri(vocab::RDF_TYPE);
        let types: Vec<_> = graph.matching(None, Some(&ty), None).collect();
        assert_eq!(types.len(), 1);
        assert!(types[0].object.is(vocab::REGULATORY_DETERMINATION));

        let link = Term::iri(format!("{}determinationOf", vocab::ARCO));
        assert_eq!(graph.matching(None, Some(&link), Some(&system)).count(), 1);
    }
}

#[test]
fn fragment_lists_missing_commitments() {
    let text = to_annotated_fragment(&helpdesk());
    assert_eq!(text.matches("arco:missingCommitment").count(), 2);
    assert!(text.contains("arco:commitmentState \"UNDERDETERMINED\""));
    assert!(text.contains("prov:generatedAtTime \"2026-03-01T12:00:00Z\"^^xsd:dateTime"));
}

#[test]
fn report_sections_appear_in_order() {
    let report = to_report(&sentinel());
    let sections = [
        "ARCO DETERMINATION CERTIFICATE",
        "CLASSIFICATION",
        "GATES",
        "MISSING COMMITMENTS",
        "EVIDENCE PATHS",
        "LEGACY PATH",
        "PROOF NEIGHBORHOOD",
        "CONSTRAINTS",
        "INCONSISTENCIES",
        "CHECKS",
        "ALL CHECKS PASSED",
    ];
    let mut from = 0;
    for section in sections {
        let at = report[from..]
            .find(section)
            .unwrap_or_else(|| panic!("{section} missing or out of order"));
        from += at + section.len();
    }
    assert!(report.contains(
        "Sentinel_FaceID_Module --has_disposition--> Sentinel_FaceID_Disposition \
         [BiometricIdentificationCapability]"
    ));
}

#[test]
fn bindings_name_their_capability_class() {
    let record = sentinel();
    let fragment = to_annotated_fragment(&record);
    assert!(fragment.contains(&format!(
        "arco:capabilityClass <{}>",
        vocab::BIOMETRIC_CAPABILITY
    )));

    let value: serde_json::Value = serde_json::from_str(&to_record(&record)).unwrap();
    let binding = &value["evidence"]["bindings"][0];
    assert_eq!(binding["capability"], vocab::BIOMETRIC_CAPABILITY);
    assert_eq!(binding["capability_name"], "BiometricIdentificationCapability");
}

#[test]
fn report_of_failed_run_says_so() {
    let report = to_report(&helpdesk());
    assert!(report.contains("SOME CHECKS FAILED"));
    assert!(report.contains("[FAIL] classification"));
}

#[test]
fn artifacts_are_written_with_parent_directories() {
    let dir = std::env::temp_dir().join(format!("arco-projectors-{}", std::process::id()));
    let paths = ArtifactPaths::in_dir(dir.join("nested"));
    let record = sentinel();
    let written = write_artifacts(&record, &paths).unwrap();

    assert_eq!(written.len(), 3);
    let read = |path: &Option<std::path::PathBuf>| {
        std::fs::read_to_string(path.as_ref().unwrap()).unwrap()
    };
    assert_eq!(read(&paths.record), to_record(&record));
    assert_eq!(read(&paths.fragment), to_annotated_fragment(&record));
    assert_eq!(read(&paths.report), to_report(&record));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn only_requested_artifacts_are_written() {
    let dir = std::env::temp_dir().join(format!("arco-requested-{}", std::process::id()));
    let record = sentinel();

    assert!(write_artifacts(&record, &ArtifactPaths::default()).unwrap().is_empty());
    assert!(!dir.exists());

    let paths = ArtifactPaths {
        fragment: Some(dir.join("only.ttl")),
        ..ArtifactPaths::default()
    };
    let written = write_artifacts(&record, &paths).unwrap();
    assert_eq!(written, vec![dir.join("only.ttl")]);
    let entries: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
    std::fs::remove_dir_all(&dir).unwrap();
}
