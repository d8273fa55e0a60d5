//! Shipped Turtle graphs, embedded for tests, benches and offline runs.
//!
//! Each constant holds one document from the workspace `ontology/`
//! directory. The builders assemble the source sets of the shipped
//! profiles as inline [`FactSource`]s.

use crate::graph::store::FactSource;

/// Core ontology: system, component, capability and the top-level class.
pub const ARCO_CORE: &str = include_str!("../../../ontology/arco_core.ttl");

/// Governance extension: documents, the narrow class and its gates.
pub const GOVERNANCE_EXTENSION: &str = include_str!("../../../ontology/arco_governance_extension.ttl");

/// Sentinel ID: fully committed biometric system.
pub const INSTANCES_SENTINEL: &str = include_str!("../../../ontology/instances_sentinel.ttl");

/// Claude 3: high-risk by capability, no use commitments.
pub const INSTANCES_CLAUDE3: &str = include_str!("../../../ontology/instances_claude3.ttl");

/// Helpdesk assistant: documentation and intended use only.
pub const INSTANCES_HELPDESK: &str = include_str!("../../../ontology/instances_helpdesk.ttl");

/// Shapes requiring assessment documentation to be about something.
pub const DOCUMENTATION_SHAPE: &str =
    include_str!("../../../ontology/shapes/assessment_documentation_shape.ttl");

/// Sentinel system IRI.
pub const SENTINEL_SYSTEM: &str = "https://arco.ai/ontology/core#Sentinel_ID_System";
/// Claude 3 system IRI.
pub const CLAUDE3_SYSTEM: &str = "https://arco.ai/ontology/core#Claude3_System";
/// Helpdesk system IRI.
pub const HELPDESK_SYSTEM: &str = "https://arco.ai/ontology/core#Helpdesk_Assistant";

/// The two ontology documents plus one instance document.
#[must_use]
pub fn sources_with(name: &str, instances: &str) -> Vec<FactSource> {
    vec![
        FactSource::inline("arco_core.ttl", ARCO_CORE),
        FactSource::inline("arco_governance_extension.ttl", GOVERNANCE_EXTENSION),
        FactSource::inline(name, instances),
    ]
}

/// Sources of the `sentinel` profile.
#[must_use]
pub fn sentinel_sources() -> Vec<FactSource> {
    sources_with("instances_sentinel.ttl", INSTANCES_SENTINEL)
}

/// Sources of the `claude3` profile.
#[must_use]
pub fn claude3_sources() -> Vec<FactSource> {
    sources_with("instances_claude3.ttl", INSTANCES_CLAUDE3)
}

/// Sources of the `helpdesk` profile.
#[must_use]
pub fn helpdesk_sources() -> Vec<FactSource> {
    sources_with("instances_helpdesk.ttl", INSTANCES_HELPDESK)
}

/// The shipped shapes source.
#[must_use]
pub fn shapes() -> FactSource {
    FactSource::inline("assessment_documentation_shape.ttl", DOCUMENTATION_SHAPE)
}

/// Sentinel instances with every triple typing a disposition as a
/// biometric identification capability removed.
#[must_use]
pub fn sentinel_without_capability_typing() -> String {
    INSTANCES_SENTINEL.replace(" , :BiometricIdentificationCapability", "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::store;
    use crate::vocab;

    #[test]
    fn every_fixture_parses() {
        for sources in [sentinel_sources(), claude3_sources(), helpdesk_sources()] {
            assert!(!store::load(&sources).unwrap().is_empty());
        }
        assert!(!store::load_shapes(&shapes()).unwrap().is_empty());
    }

    #[test]
    fn capability_typing_is_removed() {
        let stripped = sentinel_without_capability_typing();
        assert_ne!(stripped, INSTANCES_SENTINEL);
        assert!(!stripped.contains(vocab::short_name(vocab::BIOMETRIC_CAPABILITY)));
    }
}
