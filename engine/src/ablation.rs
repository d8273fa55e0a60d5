//! Ablation Harness.
//!
//! Proves each gate is load-bearing: after a baseline run confirms both
//! classifications, every designated fact is removed from its own freshly
//! loaded graph, closure is re-run in strict mode and the classification is
//! compared with [`ExpectedClassification::for_gate`].

use std::fmt::Write as _;

use tracing::{info, warn};

use crate::closure::{ClosureService, ClosureStage, Strictness};
use crate::config::AblationFact;
use crate::determination::TripleCounts;
use crate::error::{EngineError, Result};
use crate::gate::{Classification, CommitmentState, Gate, GateEvaluator};
use crate::graph::store::{self, FactSource};
use crate::graph::{Graph, Term, Triple};
use crate::query::QueryService;
use crate::vocab;

/// One fact to remove, and the gate it backs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AblationCase {
    /// Gate under test.
    pub gate: Gate,
    /// The designated fact.
    pub fact: Triple,
}

impl AblationCase {
    /// Builds a case from a profile's ablation entry.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] on an unknown CURIE prefix.
    pub fn from_fact(fact: &AblationFact) -> Result<Self> {
        Ok(Self {
            gate: fact.gate,
            fact: fact.triple()?,
        })
    }

    /// Builds every case of an ablation table.
    ///
    /// # Errors
    ///
    /// As [`AblationCase::from_fact`].
    pub fn from_table(table: &[AblationFact]) -> Result<Vec<Self>> {
        table.iter().map(Self::from_fact).collect()
    }
}

/// Classification booleans expected once a gate's fact is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedClassification {
    /// Narrow classification.
    pub annex: bool,
    /// Top-level classification.
    pub high_risk: bool,
}

impl ExpectedClassification {
    /// The expectation table. Without the capability nothing holds; without
    /// an intended-use or use-scenario commitment only the narrow
    /// classification is lost.
    #[must_use]
    pub fn for_gate(gate: Gate) -> Self {
        match gate {
            Gate::Capability => Self {
                annex: false,
                high_risk: false,
            },
            Gate::IntendedUse | Gate::UseScenario => Self {
                annex: false,
                high_risk: true,
            },
        }
    }

    /// True if `observed` matches.
    #[must_use]
    pub fn matches(&self, observed: Classification) -> bool {
        self.annex == observed.annex && self.high_risk == observed.high_risk
    }
}

/// The baseline run, with nothing removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineOutcome {
    /// Classification after closure.
    pub classification: Classification,
    /// Commitment state after closure.
    pub state: CommitmentState,
    /// Graph sizes.
    pub counts: TripleCounts,
}

/// The result of one ablation iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AblationOutcome {
    /// The case run.
    pub case: AblationCase,
    /// What the table expects.
    pub expected: ExpectedClassification,
    /// What closure produced.
    pub observed: Classification,
    /// Commitment state after removal.
    pub state: CommitmentState,
    /// Graph sizes after removal.
    pub counts: TripleCounts,
}

impl AblationOutcome {
    /// True if the observed classification matches the expectation.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.expected.matches(self.observed)
    }
}

/// Per-gate results of a harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AblationReport {
    /// System IRI.
    pub system: String,
    /// Baseline run.
    pub baseline: BaselineOutcome,
    /// One outcome per case, in case order.
    pub outcomes: Vec<AblationOutcome>,
}

impl AblationReport {
    /// Gates with no case in the run.
    #[must_use]
    pub fn uncovered_gates(&self) -> Vec<Gate> {
        Gate::ALL
            .into_iter()
            .filter(|g| !self.outcomes.iter().any(|o| o.case.gate == *g))
            .collect()
    }

    /// True if every gate was ablated and every ablation behaved as expected.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.uncovered_gates().is_empty() && self.outcomes.iter().all(AblationOutcome::passed)
    }

    /// Plain-text summary.
    #[must_use]
    pub fn render(&self) -> String {
        let flag = |b: bool| if b { "true" } else { "false" };
        let mut out = String::new();
        let _ = writeln!(out, "ABLATION: {}", vocab::short_name(&self.system));
        let _ = writeln!(
            out,
            "baseline: annex={} high_risk={} state={} ({} asserted, {} reasoned)",
            flag(self.baseline.classification.annex),
            flag(self.baseline.classification.high_risk),
            self.baseline.state,
            self.baseline.counts.asserted,
            self.baseline.counts.reasoned,
        );
        for o in &self.outcomes {
            let _ = writeln!(
                out,
                "[{}] {:<12} removed {}",
                if o.passed() { "PASS" } else { "FAIL" },
                o.case.gate.as_str(),
                o.case.fact.short_form()
            );
            let _ = writeln!(
                out,
                "       expected annex={} high_risk={}; observed annex={} high_risk={}; state={}",
                flag(o.expected.annex),
                flag(o.expected.high_risk),
                flag(o.observed.annex),
                flag(o.observed.high_risk),
                o.state
            );
        }
        for gate in self.uncovered_gates() {
            let _ = writeln!(out, "[FAIL] {:<12} no designated fact", gate.as_str());
        }
        let _ = writeln!(
            out,
            "{}",
            if self.all_passed() {
                "ALL GATES INDEPENDENTLY NECESSARY"
            } else {
                "ABLATION FAILED"
            }
        );
        out
    }
}

/// Re-runs closure and classification once per removed fact.
pub struct AblationHarness<'a> {
    closure: &'a dyn ClosureService,
    query: &'a dyn QueryService,
}

impl<'a> AblationHarness<'a> {
    /// Creates a harness over the given services.
    #[must_use]
    pub fn new(closure: &'a dyn ClosureService, query: &'a dyn QueryService) -> Self {
        Self { closure, query }
    }

    fn close(&self, asserted: &Graph) -> Result<(Graph, TripleCounts)> {
        let (reasoned, outcome) = ClosureStage::new(self.closure, Strictness::Strict).expand(asserted)?;
        let counts = TripleCounts {
            asserted: outcome.asserted_triples,
            reasoned: outcome.reasoned_triples,
            added: outcome.added_triples,
        };
        Ok((reasoned, counts))
    }

    /// Runs the baseline and every case.
    ///
    /// # Errors
    ///
    /// [`EngineError::AblationBaseline`] if the baseline does not entail both
    /// classifications, [`EngineError::AblationFactMissing`] if a designated
    /// fact is not asserted, and any load, closure or query error.
    pub fn run(&self, sources: &[FactSource], system: &str, cases: &[AblationCase]) -> Result<AblationReport> {
        let evaluator = GateEvaluator::new(self.query)?;
        let target = Term::iri(system);

        let asserted = store::load(sources)?;
        let (reasoned, counts) = self.close(&asserted)?;
        let evaluation = evaluator.evaluate(&reasoned, &target)?;
        let classification = Classification {
            annex: evaluation.signals.annex_entailed,
            high_risk: evaluation.signals.high_risk_entailed,
        };
        if !(classification.annex && classification.high_risk) {
            return Err(EngineError::AblationBaseline {
                system: system.to_owned(),
                annex: classification.annex,
                high_risk: classification.high_risk,
            });
        }
        info!(system = %target.short_name(), cases = cases.len(), "ablation baseline holds");
        let baseline = BaselineOutcome {
            classification,
            state: evaluation.state,
            counts,
        };

        let mut outcomes = Vec::with_capacity(cases.len());
        for case in cases {
            let mut graph = store::load(sources)?;
            if !graph.remove(&case.fact) {
                return Err(EngineError::AblationFactMissing {
                    gate: case.gate.as_str().to_owned(),
                    triple: case.fact.to_string(),
                });
            }
            let (reasoned, counts) = self.close(&graph)?;
            let evaluation = evaluator.evaluate(&reasoned, &target)?;
            let outcome = AblationOutcome {
                case: case.clone(),
                expected: ExpectedClassification::for_gate(case.gate),
                observed: Classification {
                    annex: evaluation.signals.annex_entailed,
                    high_risk: evaluation.signals.high_risk_entailed,
                },
                state: evaluation.state,
                counts,
            };
            if outcome.passed() {
                info!(gate = %case.gate, state = %outcome.state, "gate is load-bearing");
            } else {
                warn!(
                    gate = %case.gate,
                    annex = outcome.observed.annex,
                    high_risk = outcome.observed.high_risk,
                    "ablation did not match expectation"
                );
            }
            outcomes.push(outcome);
        }

        Ok(AblationReport {
            system: system.to_owned(),
            baseline,
            outcomes,
        })
    }
}
