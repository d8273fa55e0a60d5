//! IRI constants for the vocabularies the engine reasons over.

use crate::error::{EngineError, Result};

/// ARCO core namespace.
pub const ARCO: &str = "https://arco.ai/ontology/core#";
/// RDF namespace.
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// RDFS namespace.
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
/// OWL namespace.
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
/// XSD namespace.
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
/// SHACL namespace.
pub const SH: &str = "http://www.w3.org/ns/shacl#";
/// PROV-O namespace.
pub const PROV: &str = "http://www.w3.org/ns/prov#";
/// OBO BFO namespace.
pub const BFO: &str = "http://purl.obolibrary.org/obo/BFO_";
/// OBO Relation Ontology namespace.
pub const RO: &str = "http://purl.obolibrary.org/obo/RO_";
/// OBO Information Artifact Ontology namespace.
pub const IAO: &str = "http://purl.obolibrary.org/obo/IAO_";
/// Common Core Ontologies namespace.
pub const CCO: &str = "http://www.ontologyrepository.com/CommonCoreOntologies/";

/// Prefix table used for CURIE expansion and for rendering.
pub const PREFIXES: &[(&str, &str)] = &[
    ("", ARCO),
    ("arco", ARCO),
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("owl", OWL),
    ("xsd", XSD),
    ("sh", SH),
    ("prov", PROV),
    ("bfo", BFO),
    ("ro", RO),
    ("iao", IAO),
    ("cco", CCO),
];

// RDF / RDFS
/// `rdf:type`.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
/// `rdf:first`.
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
/// `rdf:rest`.
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
/// `rdf:nil`.
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
/// `rdf:langString`.
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
/// `rdfs:subClassOf`.
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
/// `rdfs:subPropertyOf`.
pub const RDFS_SUBPROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
/// `rdfs:domain`.
pub const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
/// `rdfs:range`.
pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
/// `rdfs:label`.
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
/// `rdfs:comment`.
pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";

// OWL
/// `owl:Thing`.
pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
/// `owl:equivalentClass`.
pub const OWL_EQUIVALENT_CLASS: &str = "http://www.w3.org/2002/07/owl#equivalentClass";
/// `owl:equivalentProperty`.
pub const OWL_EQUIVALENT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#equivalentProperty";
/// `owl:inverseOf`.
pub const OWL_INVERSE_OF: &str = "http://www.w3.org/2002/07/owl#inverseOf";
/// `owl:TransitiveProperty`.
pub const OWL_TRANSITIVE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#TransitiveProperty";
/// `owl:SymmetricProperty`.
pub const OWL_SYMMETRIC_PROPERTY: &str = "http://www.w3.org/2002/07/owl#SymmetricProperty";
/// `owl:intersectionOf`.
pub const OWL_INTERSECTION_OF: &str = "http://www.w3.org/2002/07/owl#intersectionOf";
/// `owl:unionOf`.
pub const OWL_UNION_OF: &str = "http://www.w3.org/2002/07/owl#unionOf";
/// `owl:onProperty`.
pub const OWL_ON_PROPERTY: &str = "http://www.w3.org/2002/07/owl#onProperty";
/// `owl:someValuesFrom`.
pub const OWL_SOME_VALUES_FROM: &str = "http://www.w3.org/2002/07/owl#someValuesFrom";
/// `owl:allValuesFrom`.
pub const OWL_ALL_VALUES_FROM: &str = "http://www.w3.org/2002/07/owl#allValuesFrom";
/// `owl:hasValue`.
pub const OWL_HAS_VALUE: &str = "http://www.w3.org/2002/07/owl#hasValue";

// XSD
/// `xsd:string`.
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
/// `xsd:integer`.
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
/// `xsd:boolean`.
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
/// `xsd:dateTime`.
pub const XSD_DATETIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

// Relations
/// BFO `has_part`.
pub const HAS_PART: &str = "http://purl.obolibrary.org/obo/BFO_0000051";
/// RO `has_disposition`.
pub const HAS_DISPOSITION: &str = "http://purl.obolibrary.org/obo/RO_0000091";
/// RO `bearer_of` (legacy system-level capability link).
pub const BEARER_OF: &str = "http://purl.obolibrary.org/obo/RO_0000053";
/// RO `has_participant`.
pub const HAS_PARTICIPANT: &str = "http://purl.obolibrary.org/obo/RO_0000057";
/// IAO `is_about`.
pub const IS_ABOUT: &str = "http://purl.obolibrary.org/obo/IAO_0000136";
/// CCO `prescribes`.
pub const PRESCRIBES: &str = "http://www.ontologyrepository.com/CommonCoreOntologies/prescribes";
/// CCO `has_output`.
pub const HAS_OUTPUT: &str = "http://www.ontologyrepository.com/CommonCoreOntologies/has_output";

// Classification targets
/// Top-level classification.
pub const HIGH_RISK_SYSTEM: &str = "https://arco.ai/ontology/core#HighRiskSystem";
/// Narrow classification (Annex III point 1(a)).
pub const ANNEX_III_1A_SYSTEM: &str = "https://arco.ai/ontology/core#AnnexIII1aApplicableSystem";
/// Root of the capability (disposition) classes.
pub const CAPABILITY: &str = "https://arco.ai/ontology/core#Capability";
/// Disposition class that triggers the narrow classification.
pub const BIOMETRIC_CAPABILITY: &str = "https://arco.ai/ontology/core#BiometricIdentificationCapability";
/// Document class behind the intended-use gate.
pub const INTENDED_USE_SPECIFICATION: &str = "https://arco.ai/ontology/core#IntendedUseSpecification";
/// Document class behind the use-scenario gate.
pub const USE_SCENARIO_SPECIFICATION: &str = "https://arco.ai/ontology/core#UseScenarioSpecification";
/// Document class behind the documentation signal.
pub const ASSESSMENT_DOCUMENTATION: &str = "https://arco.ai/ontology/core#AssessmentDocumentation";
/// Disposition class that triggers the top-level classification.
pub const TRIGGERING_CAPABILITY: &str =
    "https://arco.ai/ontology/core#AnnexIIITriggeringCapability";

// Determination vocabulary (annotated fragment)
/// Class of minted determination nodes.
pub const REGULATORY_DETERMINATION: &str = "https://arco.ai/ontology/core#RegulatoryDetermination";

/// Relations accepted in the relation-first proof neighborhood.
pub const PROOF_RELATIONS: &[&str] = &[
    HAS_PART,
    HAS_DISPOSITION,
    HAS_PARTICIPANT,
    IS_ABOUT,
    PRESCRIBES,
    HAS_OUTPUT,
];

/// Returns a readable name for the relations the engine reports on, or the
/// IRI's short name for anything else.
#[must_use]
pub fn relation_label(iri: &str) -> &str {
    match iri {
        HAS_PART => "has_part",
        HAS_DISPOSITION => "has_disposition",
        BEARER_OF => "bearer_of",
        HAS_PARTICIPANT => "has_participant",
        IS_ABOUT => "is_about",
        PRESCRIBES => "prescribes",
        HAS_OUTPUT => "has_output",
        RDF_TYPE => "type",
        other => short_name(other),
    }
}

/// Returns the local part of an IRI: the fragment after `#`, else the last
/// path segment.
#[must_use]
pub fn short_name(iri: &str) -> &str {
    match iri.rsplit_once('#') {
        Some((_, local)) => local,
        None => iri.rsplit('/').next().unwrap_or(iri),
    }
}

/// Expands a CURIE (`ro:0000091`, `:Sentinel_ID_System`) against [`PREFIXES`].
/// Absolute IRIs, bare or in angle brackets, pass through unchanged.
///
/// # Errors
///
/// Returns [`EngineError::Config`] when the prefix is unknown.
pub fn expand_curie(value: &str) -> Result<String> {
    let value = value.trim();
    if let Some(inner) = value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) {
        return Ok(inner.to_owned());
    }
    if value.starts_with("http://") || value.starts_with("https://") || value.starts_with("urn:") {
        return Ok(value.to_owned());
    }
    let (prefix, local) = value
        .split_once(':')
        .ok_or_else(|| EngineError::Config(format!("`{value}` is neither an IRI nor a CURIE")))?;
    PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, ns)| format!("{ns}{local}"))
        .ok_or_else(|| EngineError::Config(format!("unknown prefix `{prefix}:` in `{value}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_prefers_fragment() {
        assert_eq!(short_name(HIGH_RISK_SYSTEM), "HighRiskSystem");
        assert_eq!(short_name(HAS_PART), "BFO_0000051");
        assert_eq!(short_name("urn:x"), "urn:x");
    }

    #[test]
    fn curies_expand_against_the_prefix_table() {
        assert_eq!(expand_curie("ro:0000091").ok().as_deref(), Some(HAS_DISPOSITION));
        assert_eq!(
            expand_curie(":HighRiskSystem").ok().as_deref(),
            Some(HIGH_RISK_SYSTEM)
        );
        assert_eq!(
            expand_curie("<https://example.org/x>").ok().as_deref(),
            Some("https://example.org/x")
        );
        assert!(expand_curie("nope:thing").is_err());
        assert!(expand_curie("plainword").is_err());
    }

    #[test]
    fn known_relations_have_labels() {
        assert_eq!(relation_label(IS_ABOUT), "is_about");
        assert_eq!(relation_label(HIGH_RISK_SYSTEM), "HighRiskSystem");
    }
}
