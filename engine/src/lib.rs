//! ARCO determination engine.
//!
//! Decides whether an AI system falls under a regulatory category from a
//! graph of structural facts, and says why. One run loads the facts,
//! expands them under a closure service, checks them against shapes,
//! extracts the evidence path behind any classification, evaluates the
//! three-gate commitment state machine and aggregates everything into an
//! immutable [`DeterminationRecord`] that the projectors render.
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Fact Store Adapter | [`graph::store`] | Asserted Graph |
//! | Closure Stage | [`closure`] | Reasoned Graph, [`ClosureOutcome`] |
//! | Constraint Stage | [`constraint`] | [`ConstraintOutcome`] |
//! | Evidence Extractor | [`evidence`] | [`Evidence`], proof neighborhood |
//! | Gate Evaluator | [`gate`] | [`GateEvaluation`] |
//! | Determination Builder | [`determination`] | [`DeterminationRecord`] |
//! | Artifact Projectors | [`project`] | JSON record, Turtle fragment, text report |
//! | Ablation Harness | [`ablation`] | [`AblationReport`] |
//!
//! # Entry Point
//!
//! ```no_run
//! use arco_engine::{fixtures, run_determination, Engines, ReasonerKind, RunConfig};
//!
//! let config = RunConfig::new(
//!     fixtures::SENTINEL_SYSTEM,
//!     fixtures::sentinel_sources(),
//!     fixtures::shapes(),
//!     "2026-01-01T00:00:00Z",
//! );
//! let engines = Engines::builtin(ReasonerKind::OwlRl);
//! let record = run_determination(&config, &engines).expect("run failed");
//! assert!(record.all_checks_passed());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod ablation;
pub mod check;
pub mod closure;
pub mod config;
pub mod constraint;
pub mod determination;
pub mod error;
pub mod evidence;
pub mod fixtures;
pub mod gate;
pub mod graph;
pub mod project;
pub mod query;
pub mod vocab;

use tracing::{info, warn};

pub use ablation::{AblationCase, AblationHarness, AblationReport, ExpectedClassification};
pub use check::{CheckReport, CheckResult, Severity};
pub use closure::{
    ClosureMode, ClosureOutcome, ClosureService, ClosureStage, NoReasoner, ReasonerKind,
    RuleReasoner, Strictness,
};
pub use config::{AblationFact, Profile, ProfileSet, RunConfig};
pub use constraint::{ConstraintOutcome, ShaclValidator, ShapeValidator};
pub use determination::{
    ClassificationMode, DeterminationInputs, DeterminationRecord, Inconsistency, SystemIdentity,
};
pub use error::{EngineError, Result, SourceKind};
pub use evidence::{Evidence, EvidenceBinding, EvidenceExtractor};
pub use gate::{CommitmentState, Gate, GateEvaluation, GateEvaluator, GateSignals};
pub use graph::store::FactSource;
pub use graph::{Graph, Term, Triple};
pub use project::{
    to_annotated_fragment, to_record, to_report, write_artifacts, ArtifactPaths,
};
pub use query::{QueryService, SparqlEngine};

/// The three external collaborators a run depends on.
pub struct Engines {
    /// Closure service.
    pub closure: Box<dyn ClosureService>,
    /// Constraint service.
    pub validator: Box<dyn ShapeValidator>,
    /// Pattern-query service.
    pub query: Box<dyn QueryService>,
}

impl Engines {
    /// The reference collaborators shipped with the engine.
    #[must_use]
    pub fn builtin(reasoner: ReasonerKind) -> Self {
        let closure: Box<dyn ClosureService> = match reasoner {
            ReasonerKind::OwlRl => Box::new(RuleReasoner::new()),
            ReasonerKind::None => Box::new(NoReasoner),
        };
        Self {
            closure,
            validator: Box::new(ShaclValidator),
            query: Box::new(SparqlEngine),
        }
    }
}

/// Runs stages 1 to 6 for one system.
///
/// A failed or unjustified classification is data in the record, not an
/// error; call [`DeterminationRecord::ensure_justified`] to turn it into one.
///
/// # Errors
///
/// [`EngineError::MissingSource`] or [`EngineError::Parse`] if a source
/// cannot be loaded, [`EngineError::ClosureUnavailable`] in strict mode
/// without a reasoner, [`EngineError::Query`] on a malformed fixed query,
/// [`EngineError::MalformedShape`] on an uninterpretable shape.
pub fn run_determination(config: &RunConfig, engines: &Engines) -> Result<DeterminationRecord> {
    let system = Term::iri(config.system.as_str());
    info!(system = %system.short_name(), sources = config.sources.len(), "determination started");

    let asserted = graph::store::load(&config.sources)?;
    let shapes = graph::store::load_shapes(&config.shapes)?;
    if asserted.matching(Some(&system), None, None).next().is_none() {
        warn!(system = %config.system, "system has no asserted facts");
    }

    let (reasoned, closure) = ClosureStage::new(engines.closure.as_ref(), config.strictness).expand(&asserted)?;
    let constraints = constraint::check(engines.validator.as_ref(), &reasoned, &shapes)?;

    let evidence = EvidenceExtractor::new(engines.query.as_ref(), config.evidence_cap)?.extract(&reasoned, &system)?;
    let neighborhood = evidence::proof_neighborhood(&reasoned, &asserted, &system, config.neighborhood_cap);

    let evaluator = GateEvaluator::new(engines.query.as_ref())?;
    let gates = evaluator.evaluate(&reasoned, &system)?;
    let high_risk_asserted = evaluator.high_risk_asserted(&asserted, &system)?;

    let label = asserted
        .object(&system, &Term::iri(vocab::RDFS_LABEL))
        .and_then(Term::as_literal)
        .map(|l| l.lexical.clone());

    let record = DeterminationRecord::build(DeterminationInputs {
        system: SystemIdentity::new(config.system.as_str(), label),
        closure,
        constraints: (engines.validator.name().to_owned(), constraints),
        evidence,
        evidence_cap: config.evidence_cap,
        neighborhood,
        gates,
        high_risk_asserted,
        timestamp: config.timestamp.clone(),
        source_revision: config.source_revision.clone(),
        profile: config.profile.clone(),
        sources: config.sources.iter().map(FactSource::name).collect(),
        shapes: config.shapes.name(),
    });
    info!(
        state = %record.state(),
        mode = %record.classification().mode,
        passed = record.all_checks_passed(),
        "determination complete"
    );
    Ok(record)
}

/// Runs the ablation harness for a profile's designated facts.
///
/// # Errors
///
/// As [`AblationHarness::run`], plus [`EngineError::Config`] if a
/// designated fact does not expand.
pub fn run_ablation(
    sources: &[FactSource],
    system: &str,
    table: &[AblationFact],
    engines: &Engines,
) -> Result<AblationReport> {
    let cases = AblationCase::from_table(table)?;
    AblationHarness::new(engines.closure.as_ref(), engines.query.as_ref()).run(sources, system, &cases)
}
