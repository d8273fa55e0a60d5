//! Closure Stage.
//!
//! [`ClosureService`] is the materializer contract: expand a graph in place,
//! never remove a triple, add nothing on a second pass. [`RuleReasoner`] is
//! the shipped implementation, a forward-chaining fixpoint over an OWL 2 RL
//! rule subset. [`ClosureStage`] wraps any service with the strict/lenient
//! policy and checks monotonicity after every expansion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::graph::{Graph, Term, Triple};
use crate::vocab;

/// Materializes entailments into a graph.
pub trait ClosureService {
    /// Name recorded in run metadata.
    fn name(&self) -> &str;

    /// Adds entailed triples to `graph` and returns how many were added.
    ///
    /// # Errors
    ///
    /// [`EngineError::ClosureUnavailable`] when the service cannot run.
    fn expand(&self, graph: &mut Graph) -> Result<usize>;
}

/// How the stage reacts to an unavailable closure service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Fail the run.
    #[default]
    Strict,
    /// Continue on the asserted graph and record the degradation.
    Lenient,
}

impl Strictness {
    /// Lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strictness::Strict => "strict",
            Strictness::Lenient => "lenient",
        }
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strictness {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Strictness::Strict),
            "lenient" => Ok(Strictness::Lenient),
            other => Err(EngineError::Config(format!(
                "unknown strictness `{other}` (expected strict or lenient)"
            ))),
        }
    }
}

/// Whether the reasoned graph really is a closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureMode {
    /// The service ran; entailments are materialized.
    Materialized,
    /// The service was unavailable; the reasoned graph equals the asserted one.
    /// A `NOT_ENTAILED` outcome in this mode only means "not asserted".
    Degraded,
}

impl ClosureMode {
    /// Lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ClosureMode::Materialized => "materialized",
            ClosureMode::Degraded => "degraded",
        }
    }
}

/// What the closure stage did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureOutcome {
    /// Service name.
    pub service: String,
    /// Materialized or degraded.
    pub mode: ClosureMode,
    /// Policy in force.
    pub strictness: Strictness,
    /// Triples before expansion.
    pub asserted_triples: usize,
    /// Triples after expansion.
    pub reasoned_triples: usize,
    /// `reasoned_triples - asserted_triples`.
    pub added_triples: usize,
    /// Why the stage degraded, if it did.
    pub degraded_reason: Option<String>,
}

/// Runs a [`ClosureService`] under a [`Strictness`] policy.
pub struct ClosureStage<'a> {
    service: &'a dyn ClosureService,
    strictness: Strictness,
}

impl<'a> ClosureStage<'a> {
    /// Creates a stage.
    #[must_use]
    pub fn new(service: &'a dyn ClosureService, strictness: Strictness) -> Self {
        Self {
            service,
            strictness,
        }
    }

    /// Expands a deep copy of `asserted`. The asserted graph is untouched.
    ///
    /// # Errors
    ///
    /// [`EngineError::ClosureUnavailable`] in strict mode when the service
    /// cannot run; [`EngineError::ClosureContract`] when the service dropped
    /// asserted triples.
    pub fn expand(&self, asserted: &Graph) -> Result<(Graph, ClosureOutcome)> {
        let mut reasoned = asserted.clone();
        let service = self.service.name().to_owned();
        match self.service.expand(&mut reasoned) {
            Ok(_) => {
                let removed = asserted.difference(&reasoned).count();
                if removed > 0 {
                    return Err(EngineError::ClosureContract { service, removed });
                }
                let outcome = ClosureOutcome {
                    service,
                    mode: ClosureMode::Materialized,
                    strictness: self.strictness,
                    asserted_triples: asserted.len(),
                    reasoned_triples: reasoned.len(),
                    added_triples: reasoned.len() - asserted.len(),
                    degraded_reason: None,
                };
                info!(
                    service = %outcome.service,
                    asserted = outcome.asserted_triples,
                    reasoned = outcome.reasoned_triples,
                    "closure materialized"
                );
                Ok((reasoned, outcome))
            }
            Err(EngineError::ClosureUnavailable { reason })
                if self.strictness == Strictness::Lenient =>
            {
                warn!(%service, %reason, "closure unavailable, continuing on asserted graph");
                let outcome = ClosureOutcome {
                    service,
                    mode: ClosureMode::Degraded,
                    strictness: self.strictness,
                    asserted_triples: asserted.len(),
                    reasoned_triples: asserted.len(),
                    added_triples: 0,
                    degraded_reason: Some(reason),
                };
                Ok((asserted.clone(), outcome))
            }
            Err(e) => Err(e),
        }
    }
}

/// Stand-in for an absent reasoning dependency.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReasoner;

impl ClosureService for NoReasoner {
    fn name(&self) -> &str {
        "none"
    }

    fn expand(&self, _graph: &mut Graph) -> Result<usize> {
        Err(EngineError::ClosureUnavailable {
            reason: "no reasoner configured".to_owned(),
        })
    }
}

type Rule = fn(&Vocab, &Graph, &mut Vec<Triple>);

/// Rule table, applied in this order each round.
const RULES: &[(&str, Rule)] = &[
    ("scm-sco", scm_sco),
    ("scm-eqc1", scm_eqc1),
    ("scm-eqp1", scm_eqp1),
    ("cax-sco", cax_sco),
    ("prp-spo1", prp_spo1),
    ("prp-inv", prp_inv),
    ("prp-symp", prp_symp),
    ("prp-trp", prp_trp),
    ("prp-dom", prp_dom),
    ("prp-rng", prp_rng),
    ("cls-int1", cls_int1),
    ("cls-int2", cls_int2),
    ("cls-uni", cls_uni),
    ("cls-svf", cls_svf),
    ("cls-avf", cls_avf),
    ("cls-hv", cls_hv),
];

/// Forward-chaining OWL 2 RL subset reasoner.
///
/// No rule mints a term, so the fixpoint is reached after finitely many
/// rounds. `owl:sameAs` is not handled.
#[derive(Debug, Clone, Copy)]
pub struct RuleReasoner {
    max_rounds: usize,
}

impl Default for RuleReasoner {
    fn default() -> Self {
        Self { max_rounds: 64 }
    }
}

impl RuleReasoner {
    /// Creates a reasoner with the default round limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the round limit. Reaching it is reported as unavailability
    /// rather than returning a partial closure.
    #[must_use]
    pub fn with_max_rounds(max_rounds: usize) -> Self {
        Self { max_rounds }
    }
}

impl ClosureService for RuleReasoner {
    fn name(&self) -> &str {
        "owl-rl"
    }

    fn expand(&self, graph: &mut Graph) -> Result<usize> {
        let v = Vocab::new();
        let before = graph.len();
        for round in 1..=self.max_rounds {
            let mut added = 0;
            for (name, rule) in RULES {
                let mut derived = Vec::new();
                rule(&v, graph, &mut derived);
                let fresh = derived
                    .into_iter()
                    .filter(|t| !t.subject.is_literal() && t.predicate.is_iri())
                    .filter(|t| graph.insert(t.clone()))
                    .count();
                if fresh > 0 {
                    debug!(rule = *name, round, fresh, "rule fired");
                }
                added += fresh;
            }
            if added == 0 {
                debug!(rounds = round, added = graph.len() - before, "fixpoint reached");
                return Ok(graph.len() - before);
            }
        }
        Err(EngineError::ClosureUnavailable {
            reason: format!("no fixpoint after {} rounds", self.max_rounds),
        })
    }
}

/// Pre-built predicate terms.
struct Vocab {
    ty: Term,
    sco: Term,
    spo: Term,
    dom: Term,
    rng: Term,
    eqc: Term,
    eqp: Term,
    inv: Term,
    trans: Term,
    sym: Term,
    int: Term,
    uni: Term,
    on: Term,
    svf: Term,
    avf: Term,
    hv: Term,
    thing: Term,
}

impl Vocab {
    fn new() -> Self {
        Self {
            ty: Term::iri(vocab::RDF_TYPE),
            sco: Term::iri(vocab::RDFS_SUBCLASS_OF),
            spo: Term::iri(vocab::RDFS_SUBPROPERTY_OF),
            dom: Term::iri(vocab::RDFS_DOMAIN),
            rng: Term::iri(vocab::RDFS_RANGE),
            eqc: Term::iri(vocab::OWL_EQUIVALENT_CLASS),
            eqp: Term::iri(vocab::OWL_EQUIVALENT_PROPERTY),
            inv: Term::iri(vocab::OWL_INVERSE_OF),
            trans: Term::iri(vocab::OWL_TRANSITIVE_PROPERTY),
            sym: Term::iri(vocab::OWL_SYMMETRIC_PROPERTY),
            int: Term::iri(vocab::OWL_INTERSECTION_OF),
            uni: Term::iri(vocab::OWL_UNION_OF),
            on: Term::iri(vocab::OWL_ON_PROPERTY),
            svf: Term::iri(vocab::OWL_SOME_VALUES_FROM),
            avf: Term::iri(vocab::OWL_ALL_VALUES_FROM),
            hv: Term::iri(vocab::OWL_HAS_VALUE),
            thing: Term::iri(vocab::OWL_THING),
        }
    }

    fn typed(&self, node: &Term, class: &Term) -> Triple {
        Triple::new(node.clone(), self.ty.clone(), class.clone())
    }
}

fn scm_sco(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for a in g.matching(None, Some(&v.sco), None) {
        for c in g.objects(&a.object, &v.sco) {
            out.push(Triple::new(a.subject.clone(), v.sco.clone(), c.clone()));
        }
    }
}

fn scm_eqc1(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for t in g.matching(None, Some(&v.eqc), None) {
        out.push(Triple::new(t.subject.clone(), v.sco.clone(), t.object.clone()));
        out.push(Triple::new(t.object.clone(), v.sco.clone(), t.subject.clone()));
    }
}

fn scm_eqp1(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for t in g.matching(None, Some(&v.eqp), None) {
        out.push(Triple::new(t.subject.clone(), v.spo.clone(), t.object.clone()));
        out.push(Triple::new(t.object.clone(), v.spo.clone(), t.subject.clone()));
    }
}

fn cax_sco(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for sc in g.matching(None, Some(&v.sco), None) {
        for x in g.subjects(&v.ty, &sc.subject) {
            out.push(v.typed(x, &sc.object));
        }
    }
}

fn prp_spo1(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for sp in g.matching(None, Some(&v.spo), None) {
        for t in g.matching(None, Some(&sp.subject), None) {
            out.push(Triple::new(t.subject.clone(), sp.object.clone(), t.object.clone()));
        }
    }
}

/// prp-inv1 and prp-inv2.
fn prp_inv(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for inv in g.matching(None, Some(&v.inv), None) {
        for (from, to) in [(&inv.subject, &inv.object), (&inv.object, &inv.subject)] {
            for t in g.matching(None, Some(from), None) {
                out.push(Triple::new(t.object.clone(), to.clone(), t.subject.clone()));
            }
        }
    }
}

fn prp_symp(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for p in g.subjects(&v.ty, &v.sym) {
        for t in g.matching(None, Some(p), None) {
            out.push(Triple::new(t.object.clone(), p.clone(), t.subject.clone()));
        }
    }
}

fn prp_trp(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for p in g.subjects(&v.ty, &v.trans) {
        for a in g.matching(None, Some(p), None) {
            for z in g.objects(&a.object, p) {
                out.push(Triple::new(a.subject.clone(), p.clone(), z.clone()));
            }
        }
    }
}

fn prp_dom(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for d in g.matching(None, Some(&v.dom), None) {
        for t in g.matching(None, Some(&d.subject), None) {
            out.push(v.typed(&t.subject, &d.object));
        }
    }
}

fn prp_rng(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for r in g.matching(None, Some(&v.rng), None) {
        for t in g.matching(None, Some(&r.subject), None) {
            out.push(v.typed(&t.object, &r.object));
        }
    }
}

fn cls_int1(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for def in g.matching(None, Some(&v.int), None) {
        let Some(members) = g.list_items(&def.object) else {
            continue;
        };
        let Some((first, rest)) = members.split_first() else {
            continue;
        };
        for y in g.subjects(&v.ty, first) {
            if rest.iter().all(|c| g.has_type(y, c)) {
                out.push(v.typed(y, &def.subject));
            }
        }
    }
}

fn cls_int2(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for def in g.matching(None, Some(&v.int), None) {
        let Some(members) = g.list_items(&def.object) else {
            continue;
        };
        for y in g.subjects(&v.ty, &def.subject) {
            for c in &members {
                out.push(v.typed(y, c));
            }
        }
    }
}

fn cls_uni(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for def in g.matching(None, Some(&v.uni), None) {
        let Some(members) = g.list_items(&def.object) else {
            continue;
        };
        for c in &members {
            for y in g.subjects(&v.ty, c) {
                out.push(v.typed(y, &def.subject));
            }
        }
    }
}

/// cls-svf1, and cls-svf2 when the filler is `owl:Thing`.
fn cls_svf(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for r in g.matching(None, Some(&v.svf), None) {
        let (restriction, filler) = (&r.subject, &r.object);
        for p in g.objects(restriction, &v.on) {
            for t in g.matching(None, Some(p), None) {
                if filler == &v.thing || g.has_type(&t.object, filler) {
                    out.push(v.typed(&t.subject, restriction));
                }
            }
        }
    }
}

fn cls_avf(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for r in g.matching(None, Some(&v.avf), None) {
        let (restriction, filler) = (&r.subject, &r.object);
        for p in g.objects(restriction, &v.on) {
            for u in g.subjects(&v.ty, restriction) {
                for value in g.objects(u, p) {
                    out.push(v.typed(value, filler));
                }
            }
        }
    }
}

/// cls-hv1 and cls-hv2.
fn cls_hv(v: &Vocab, g: &Graph, out: &mut Vec<Triple>) {
    for r in g.matching(None, Some(&v.hv), None) {
        let (restriction, value) = (&r.subject, &r.object);
        for p in g.objects(restriction, &v.on) {
            for u in g.subjects(&v.ty, restriction) {
                out.push(Triple::new(u.clone(), p.clone(), value.clone()));
            }
            for u in g.subjects(p, value) {
                out.push(v.typed(u, restriction));
            }
        }
    }
}

/// Parses the `--reasoner` selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReasonerKind {
    /// [`RuleReasoner`].
    #[default]
    OwlRl,
    /// [`NoReasoner`].
    None,
}

impl FromStr for ReasonerKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "owl-rl" | "owlrl" => Ok(ReasonerKind::OwlRl),
            "none" => Ok(ReasonerKind::None),
            other => Err(EngineError::Config(format!(
                "unknown reasoner `{other}` (expected owl-rl or none)"
            ))),
        }
    }
}
