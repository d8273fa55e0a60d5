//! Evidence Extractor.
//!
//! Finds every `(component, disposition)` binding of the triggering pattern
//!
//! ```text
//! system --has_part--> component --has_disposition--> disposition
//! disposition a AnnexIIITriggeringCapability
//! ```
//!
//! over the Reasoned Graph, plus two diagnostics that never justify a
//! classification: the legacy `system --bearer_of--> disposition` path and
//! the relation-first proof neighborhood around the system.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::graph::{Graph, Term, Triple};
use crate::query::{Query, QueryService, Row, PROLOGUE};
use crate::vocab;

// ?capability: the disposition's named capability classes with no narrower
// named capability class among its types.
const BINDINGS: &str = "
SELECT DISTINCT ?component ?disposition ?capability WHERE {
  ?system bfo:0000051 ?component .
  ?component ro:0000091 ?disposition .
  ?disposition a :AnnexIIITriggeringCapability .
  OPTIONAL {
    ?disposition a ?capability .
    ?capability rdfs:subClassOf :Capability .
    FILTER (isIRI(?capability) && ?capability NOT IN (:Capability, :AnnexIIITriggeringCapability))
    FILTER NOT EXISTS {
      ?disposition a ?narrower .
      ?narrower rdfs:subClassOf ?capability .
      FILTER (isIRI(?narrower) && ?narrower != ?capability)
    }
  }
}";

const LEGACY: &str = "
SELECT DISTINCT ?disposition WHERE {
  ?system ro:0000053 ?disposition .
  ?disposition a :AnnexIIITriggeringCapability .
}";

/// One instantiation of the triggering pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceBinding {
    /// The component the system has as part.
    pub component: Term,
    /// The triggering disposition the component bears.
    pub disposition: Term,
    /// Most specific named capability class of the disposition. Ties go
    /// to the first by short name.
    pub capability: Option<Term>,
}

impl EvidenceBinding {
    /// Ordering key: short names first, full terms to break ties.
    fn sort_key(&self) -> (String, String, &Term, &Term) {
        (
            self.component.short_name(),
            self.disposition.short_name(),
            &self.component,
            &self.disposition,
        )
    }

    /// `component -> disposition [capability]` with short names.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut line = format!(
            "{} --has_disposition--> {}",
            self.component.short_name(),
            self.disposition.short_name()
        );
        if let Some(capability) = &self.capability {
            let _ = write!(line, " [{}]", capability.short_name());
        }
        line
    }
}

/// Extracted evidence for one system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    /// Bindings, ordered and capped.
    pub bindings: Vec<EvidenceBinding>,
    /// Number of bindings before the cap.
    pub total_bindings: usize,
    /// Triggering dispositions reached over the legacy bearer path.
    pub legacy_dispositions: Vec<Term>,
}

impl Evidence {
    /// True if at least one binding of the triggering pattern exists.
    #[must_use]
    pub fn primary_path_present(&self) -> bool {
        self.total_bindings > 0
    }

    /// True if the legacy bearer path reaches a triggering disposition.
    #[must_use]
    pub fn legacy_path_present(&self) -> bool {
        !self.legacy_dispositions.is_empty()
    }

    /// Unique short names of the bound dispositions, sorted.
    #[must_use]
    pub fn triggering_dispositions(&self) -> Vec<String> {
        self.bindings
            .iter()
            .map(|b| b.disposition.short_name())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Runs the fixed evidence queries through a [`QueryService`].
pub struct EvidenceExtractor<'a> {
    service: &'a dyn QueryService,
    bindings: Query,
    legacy: Query,
    cap: usize,
}

impl<'a> EvidenceExtractor<'a> {
    /// Parses the fixed query set.
    ///
    /// # Errors
    ///
    /// [`EngineError::Query`] if a fixed query does not parse,
    /// [`EngineError::Config`] if `cap` is zero.
    pub fn new(service: &'a dyn QueryService, cap: usize) -> Result<Self> {
        if cap == 0 {
            return Err(EngineError::Config("evidence cap must be at least 1".to_owned()));
        }
        Ok(Self {
            service,
            bindings: Query::parse(&format!("{PROLOGUE}{BINDINGS}"))?,
            legacy: Query::parse(&format!("{PROLOGUE}{LEGACY}"))?,
            cap,
        })
    }

    /// Extracts the evidence for `system` from the Reasoned Graph.
    ///
    /// # Errors
    ///
    /// [`EngineError::Query`] if evaluation fails.
    pub fn extract(&self, reasoned: &Graph, system: &Term) -> Result<Evidence> {
        let query = self.bindings.clone().with_binding("system", system.clone())?;
        let mut capabilities: BTreeMap<(Term, Term), Option<Term>> = BTreeMap::new();
        for row in self.service.select(reasoned, &query)? {
            let (Some(component), Some(disposition)) =
                (take(&row, "component"), take(&row, "disposition"))
            else {
                continue;
            };
            let slot = capabilities.entry((component, disposition)).or_default();
            if let Some(candidate) = take(&row, "capability") {
                let keep = matches!(
                    &*slot,
                    Some(current) if capability_key(current) <= capability_key(&candidate)
                );
                if !keep {
                    *slot = Some(candidate);
                }
            }
        }
        let mut bindings: Vec<EvidenceBinding> = capabilities
            .into_iter()
            .map(|((component, disposition), capability)| EvidenceBinding {
                component,
                disposition,
                capability,
            })
            .collect();
        bindings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        bindings.dedup();
        let total_bindings = bindings.len();
        bindings.truncate(self.cap);

        let legacy = self.legacy.clone().with_binding("system", system.clone())?;
        let legacy_dispositions: Vec<Term> = self
            .service
            .select(reasoned, &legacy)?
            .into_iter()
            .filter_map(|row| take(&row, "disposition"))
            .collect();

        for b in &bindings {
            debug!(binding = %b.describe(), "evidence binding");
        }
        info!(
            system = %system.short_name(),
            bindings = total_bindings,
            legacy = legacy_dispositions.len(),
            "evidence extracted"
        );
        Ok(Evidence {
            bindings,
            total_bindings,
            legacy_dispositions,
        })
    }
}

fn take(row: &Row, variable: &str) -> Option<Term> {
    row.get(variable).cloned()
}

fn capability_key(class: &Term) -> (String, &Term) {
    (class.short_name(), class)
}

/// Whether a proof edge was in the source data or added by closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
    /// Present in the Asserted Graph.
    Asserted,
    /// Present only in the Reasoned Graph.
    Entailed,
}

impl Provenance {
    /// Lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Asserted => "asserted",
            Provenance::Entailed => "entailed",
        }
    }
}

/// One named-term edge around the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofEdge {
    /// The edge.
    pub triple: Triple,
    /// Asserted or entailed.
    pub provenance: Provenance,
}

/// Relation-first neighborhood of the system, ordered and capped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofNeighborhood {
    /// Edges after the cap.
    pub edges: Vec<ProofEdge>,
    /// Edges before the cap.
    pub total_edges: usize,
}

/// Collects the proof neighborhood of `system`: its own relation edges in
/// both directions, then the outgoing and incoming edges of every named
/// node one relation away (components, documents about it, processes it
/// participates in). Only [`vocab::PROOF_RELATIONS`] are followed.
#[must_use]
pub fn proof_neighborhood(
    reasoned: &Graph,
    asserted: &Graph,
    system: &Term,
    cap: usize,
) -> ProofNeighborhood {
    let relations: Vec<Term> = vocab::PROOF_RELATIONS.iter().map(|r| Term::iri(*r)).collect();
    let edges_of = |node: &Term| -> Vec<Triple> {
        relations
            .iter()
            .flat_map(|p| {
                reasoned
                    .matching(Some(node), Some(p), None)
                    .chain(reasoned.matching(None, Some(p), Some(node)))
                    .filter(|t| t.subject.is_iri() && t.object.is_iri())
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    };

    let mut found: BTreeSet<Triple> = BTreeSet::new();
    let first_ring = edges_of(system);
    let neighbors: BTreeSet<Term> = first_ring
        .iter()
        .map(|t| if &t.subject == system { t.object.clone() } else { t.subject.clone() })
        .collect();
    found.extend(first_ring);
    for node in &neighbors {
        found.extend(edges_of(node));
    }

    let mut edges: Vec<ProofEdge> = found
        .into_iter()
        .map(|triple| {
            let provenance = if asserted.contains(&triple) {
                Provenance::Asserted
            } else {
                Provenance::Entailed
            };
            ProofEdge { triple, provenance }
        })
        .collect();
    edges.sort_by(|a, b| edge_key(&a.triple).cmp(&edge_key(&b.triple)));
    let total_edges = edges.len();
    edges.truncate(cap);
    debug!(total = total_edges, kept = edges.len(), "proof neighborhood");
    ProofNeighborhood { edges, total_edges }
}

fn edge_key(t: &Triple) -> (String, String, String, &Triple) {
    let relation = t.predicate.as_iri().map(vocab::relation_label).unwrap_or_default();
    (
        t.subject.short_name(),
        relation.to_owned(),
        t.object.short_name(),
        t,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::store::parse_into;
    use crate::query::SparqlEngine;

    const DATA: &str = "
@prefix : <https://arco.ai/ontology/core#> .
@prefix bfo: <http://purl.obolibrary.org/obo/BFO_> .
@prefix ro: <http://purl.obolibrary.org/obo/RO_> .
@prefix iao: <http://purl.obolibrary.org/obo/IAO_> .
:Sys bfo:0000051 :Zeta , :Alpha , :Plain .
:Zeta ro:0000091 :D2 , :D1 .
:Alpha ro:0000091 :D3 .
:Plain ro:0000091 :Harmless .
:D1 a :AnnexIIITriggeringCapability .
:D2 a :AnnexIIITriggeringCapability .
:D3 a :AnnexIIITriggeringCapability .
:Sys ro:0000053 :D1 .
:Doc iao:0000136 :Sys .
";

    fn graph() -> Graph {
        let mut g = Graph::new();
        parse_into(&mut g, "data", DATA, 0).unwrap();
        g
    }

    fn sys() -> Term {
        Term::iri(format!("{}Sys", vocab::ARCO))
    }

    #[test]
    fn bindings_are_ordered_by_short_names_and_capped() {
        let g = graph();
        let evidence = EvidenceExtractor::new(&SparqlEngine, 2)
            .unwrap()
            .extract(&g, &sys())
            .unwrap();
        assert_eq!(evidence.total_bindings, 3);
        let names: Vec<_> = evidence
            .bindings
            .iter()
            .map(|b| (b.component.short_name(), b.disposition.short_name()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Alpha".to_owned(), "D3".to_owned()),
                ("Zeta".to_owned(), "D1".to_owned()),
            ]
        );
        assert!(evidence.primary_path_present());
        assert!(evidence.legacy_path_present());
        assert_eq!(evidence.triggering_dispositions(), vec!["D1", "D3"]);
    }

    #[test]
    fn bindings_carry_the_most_specific_capability_class() {
        let mut g = Graph::new();
        parse_into(
            &mut g,
            "classes",
            "@prefix : <https://arco.ai/ontology/core#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix bfo: <http://purl.obolibrary.org/obo/BFO_> .
@prefix ro: <http://purl.obolibrary.org/obo/RO_> .
:VisionCapability rdfs:subClassOf :BiometricIdentificationCapability , :Capability .
:BiometricIdentificationCapability rdfs:subClassOf :Capability .
:AutonomousAgentCapability rdfs:subClassOf :Capability .
:Sys bfo:0000051 :Cam .
:Cam ro:0000091 :See , :Act , :Bare .
:See a :AnnexIIITriggeringCapability , :Capability ,
       :BiometricIdentificationCapability , :VisionCapability .
:Act a :AnnexIIITriggeringCapability ,
       :BiometricIdentificationCapability , :AutonomousAgentCapability .
:Bare a :AnnexIIITriggeringCapability .
",
            0,
        )
        .unwrap();
        let evidence = EvidenceExtractor::new(&SparqlEngine, 5)
            .unwrap()
            .extract(&g, &sys())
            .unwrap();
        let classes: Vec<_> = evidence
            .bindings
            .iter()
            .map(|b| (b.disposition.short_name(), b.capability.as_ref().map(Term::short_name)))
            .collect();
        assert_eq!(
            classes,
            vec![
                ("Act".to_owned(), Some("AutonomousAgentCapability".to_owned())),
                ("Bare".to_owned(), None),
                ("See".to_owned(), Some("VisionCapability".to_owned())),
            ]
        );
        assert_eq!(
            evidence.bindings[2].describe(),
            "Cam --has_disposition--> See [VisionCapability]"
        );
        assert_eq!(evidence.bindings[1].describe(), "Cam --has_disposition--> Bare");
    }

    #[test]
    fn no_bindings_for_unknown_system() {
        let evidence = EvidenceExtractor::new(&SparqlEngine, 5)
            .unwrap()
            .extract(&graph(), &Term::iri("urn:nobody"))
            .unwrap();
        assert!(!evidence.primary_path_present());
        assert!(!evidence.legacy_path_present());
        assert!(evidence.bindings.is_empty());
    }

    #[test]
    fn zero_cap_is_rejected() {
        assert!(matches!(
            EvidenceExtractor::new(&SparqlEngine, 0),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn neighborhood_tags_provenance() {
        let asserted = graph();
        let mut reasoned = asserted.clone();
        reasoned.insert(Triple::new(
            Term::iri(format!("{}Doc", vocab::ARCO)),
            Term::iri(vocab::IS_ABOUT),
            Term::iri(format!("{}Zeta", vocab::ARCO)),
        ));
        let hood = proof_neighborhood(&reasoned, &asserted, &sys(), 50);
        // 3 has_part + 1 is_about around Sys, 4 has_disposition, 1 entailed is_about.
        assert_eq!(hood.total_edges, 9);
        let entailed: Vec<_> = hood
            .edges
            .iter()
            .filter(|e| e.provenance == Provenance::Entailed)
            .collect();
        assert_eq!(entailed.len(), 1);
        assert_eq!(entailed[0].triple.short_form(), "Doc --is_about--> Zeta");

        let capped = proof_neighborhood(&reasoned, &asserted, &sys(), 2);
        assert_eq!(capped.edges.len(), 2);
        assert_eq!(capped.total_edges, 9);
    }
}
