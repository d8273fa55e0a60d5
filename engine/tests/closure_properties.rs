//! Property-based tests for the closure stage and the commitment state machine.
//!
//! Graphs are drawn from a small vocabulary so that rules actually fire:
//! subclass and subproperty chains, inverse, symmetric and transitive
//! properties, domains and ranges.

use proptest::prelude::*;

use arco_engine::vocab;
use arco_engine::{ClosureService, CommitmentState, GateSignals, Graph, RuleReasoner, Term, Triple};

const NODES: &[&str] = &["urn:n:a", "urn:n:b", "urn:n:c", "urn:n:d"];
const CLASSES: &[&str] = &["urn:c:A", "urn:c:B", "urn:c:C"];
const PROPERTIES: &[&str] = &["urn:p:p", "urn:p:q", "urn:p:r"];

fn pick(pool: &'static [&'static str]) -> impl Strategy<Value = Term> {
    (0..pool.len()).prop_map(move |i| Term::iri(pool[i]))
}

fn triple() -> impl Strategy<Value = Triple> {
    prop_oneof![
        (pick(NODES), pick(PROPERTIES), pick(NODES)).prop_map(|(s, p, o)| Triple::new(s, p, o)),
        (pick(NODES), pick(CLASSES))
            .prop_map(|(s, c)| Triple::new(s, Term::iri(vocab::RDF_TYPE), c)),
        (pick(CLASSES), pick(CLASSES))
            .prop_map(|(a, b)| Triple::new(a, Term::iri(vocab::RDFS_SUBCLASS_OF), b)),
        (pick(PROPERTIES), pick(PROPERTIES))
            .prop_map(|(a, b)| Triple::new(a, Term::iri(vocab::RDFS_SUBPROPERTY_OF), b)),
        (pick(PROPERTIES), pick(PROPERTIES))
            .prop_map(|(a, b)| Triple::new(a, Term::iri(vocab::OWL_INVERSE_OF), b)),
        (pick(PROPERTIES), pick(CLASSES))
            .prop_map(|(p, c)| Triple::new(p, Term::iri(vocab::RDFS_DOMAIN), c)),
        (pick(PROPERTIES), pick(CLASSES))
            .prop_map(|(p, c)| Triple::new(p, Term::iri(vocab::RDFS_RANGE), c)),
        pick(PROPERTIES).prop_map(|p| Triple::new(
            p,
            Term::iri(vocab::RDF_TYPE),
            Term::iri(vocab::OWL_TRANSITIVE_PROPERTY)
        )),
        pick(PROPERTIES).prop_map(|p| Triple::new(
            p,
            Term::iri(vocab::RDF_TYPE),
            Term::iri(vocab::OWL_SYMMETRIC_PROPERTY)
        )),
    ]
}

fn graph() -> impl Strategy<Value = Graph> {
    prop::collection::vec(triple(), 0..24).prop_map(|ts| ts.into_iter().collect())
}

fn expand(g: &Graph) -> Graph {
    let mut out = g.clone();
    RuleReasoner::new().expand(&mut out).unwrap();
    out
}

// =============================================================================
// Closure
// =============================================================================

proptest! {
    /// expand(G) ⊇ G
    #[test]
    fn prop_closure_is_monotonic(g in graph()) {
        let reasoned = expand(&g);
        prop_assert!(g.is_subset_of(&reasoned));
    }

    /// A second expansion adds nothing.
    #[test]
    fn prop_closure_is_idempotent(g in graph()) {
        let mut reasoned = expand(&g);
        let added = RuleReasoner::new().expand(&mut reasoned).unwrap();
        prop_assert_eq!(added, 0);
        prop_assert_eq!(reasoned, expand(&g));
    }

    /// Adding facts never loses inferences.
    #[test]
    fn prop_closure_preserves_inclusion(g in graph(), extra in graph()) {
        let mut bigger = g.clone();
        bigger.extend(extra.iter().cloned());
        prop_assert!(expand(&g).is_subset_of(&expand(&bigger)));
    }
}

// =============================================================================
// Commitment state
// =============================================================================

proptest! {
    /// Every combination of the seven signals yields exactly one state,
    /// following the first-match rule.
    #[test]
    fn prop_commitment_state_is_total(bits in 0u8..128) {
        let bit = |i: u8| (bits & (1 << i)) != 0;
        let signals = GateSignals {
            annex_entailed: bit(0),
            high_risk_entailed: bit(1),
            capability: bit(2),
            intended_use: bit(3),
            use_scenario: bit(4),
            documentation: bit(5),
            capability_signal: bit(6),
        };
        let expected = if bit(0) || bit(1) {
            CommitmentState::Entailed
        } else if bits >> 2 != 0 {
            CommitmentState::Underdetermined
        } else {
            CommitmentState::NotEntailed
        };
        prop_assert_eq!(signals.commitment_state(), expected);

        let missing = signals.missing_commitments().len();
        let unsatisfied = [bit(2), bit(3), bit(4)].iter().filter(|b| !**b).count();
        prop_assert_eq!(missing, unsatisfied);
    }
}
