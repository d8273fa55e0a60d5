//! Gate Evaluator and the commitment state machine.
//!
//! Each gate is its own query so the ablation harness can knock out one
//! at a time. The state is derived by [`GateSignals::commitment_state`],
//! a total function of seven booleans.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::graph::{Graph, Term};
use crate::query::{Query, QueryService, PROLOGUE};

const ANNEX: &str = "ASK { ?system a :AnnexIII1aApplicableSystem }";
const HIGH_RISK: &str = "ASK { ?system a :HighRiskSystem }";

const CAPABILITY: &str = "
ASK {
  ?system bfo:0000051 ?component .
  ?component ro:0000091 ?disposition .
  ?disposition a :BiometricIdentificationCapability .
}";

const INTENDED_USE: &str = "
ASK {
  ?doc a :IntendedUseSpecification ;
       iao:0000136 ?system .
}";

const USE_SCENARIO: &str = "
ASK {
  ?doc a :UseScenarioSpecification ;
       iao:0000136 ?system .
}";

const DOCUMENTATION: &str = "
ASK {
  ?doc a :AssessmentDocumentation ;
       iao:0000136 ?system .
}";

const CAPABILITY_SIGNAL: &str = "
ASK {
  ?system bfo:0000051 ?component .
  ?component ro:0000091 ?disposition .
  ?disposition a :Capability .
}";

const LEGACY_CAPABILITY_SIGNAL: &str = "
ASK {
  ?system ro:0000053 ?disposition .
  ?disposition a :Capability .
}";

/// Three-valued outcome of the gate pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitmentState {
    /// A target classification holds after closure.
    Entailed,
    /// Some commitments exist but the pattern is not closed.
    Underdetermined,
    /// No evidence at all.
    NotEntailed,
}

impl CommitmentState {
    /// Upper-case wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CommitmentState::Entailed => "ENTAILED",
            CommitmentState::Underdetermined => "UNDERDETERMINED",
            CommitmentState::NotEntailed => "NOT_ENTAILED",
        }
    }
}

impl fmt::Display for CommitmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Gate 1: a component bears a biometric identification capability.
    Capability,
    /// Gate 2: an intended-use specification is about the system.
    IntendedUse,
    /// Gate 3: a use-scenario specification is about the system.
    UseScenario,
}

impl Gate {
    /// All gates in evaluation order.
    pub const ALL: [Gate; 3] = [Gate::Capability, Gate::IntendedUse, Gate::UseScenario];

    /// Snake-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gate::Capability => "capability",
            Gate::IntendedUse => "intended_use",
            Gate::UseScenario => "use_scenario",
        }
    }

    /// The fixed line reported when the gate is not satisfied.
    #[must_use]
    pub fn missing_commitment(self) -> &'static str {
        match self {
            Gate::Capability => {
                "No component bears a biometric identification capability (gate 1: capability)"
            }
            Gate::IntendedUse => {
                "No intended-use specification is about the system (gate 2: intended_use)"
            }
            Gate::UseScenario => {
                "No use-scenario specification is about the system (gate 3: use_scenario)"
            }
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs of the state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateSignals {
    /// The narrow classification holds.
    pub annex_entailed: bool,
    /// The top-level classification holds.
    pub high_risk_entailed: bool,
    /// Gate 1.
    pub capability: bool,
    /// Gate 2.
    pub intended_use: bool,
    /// Gate 3.
    pub use_scenario: bool,
    /// Some assessment documentation is about the system.
    pub documentation: bool,
    /// The system carries some capability at all.
    pub capability_signal: bool,
}

impl GateSignals {
    /// The value of one gate.
    #[must_use]
    pub fn gate(&self, gate: Gate) -> bool {
        match gate {
            Gate::Capability => self.capability,
            Gate::IntendedUse => self.intended_use,
            Gate::UseScenario => self.use_scenario,
        }
    }

    /// First match wins: a classification, then any partial signal.
    #[must_use]
    pub fn commitment_state(&self) -> CommitmentState {
        if self.annex_entailed || self.high_risk_entailed {
            CommitmentState::Entailed
        } else if self.capability
            || self.intended_use
            || self.use_scenario
            || self.documentation
            || self.capability_signal
        {
            CommitmentState::Underdetermined
        } else {
            CommitmentState::NotEntailed
        }
    }

    /// One line per unsatisfied gate, whatever the state.
    #[must_use]
    pub fn missing_commitments(&self) -> Vec<String> {
        Gate::ALL
            .iter()
            .filter(|g| !self.gate(**g))
            .map(|g| g.missing_commitment().to_owned())
            .collect()
    }
}

/// Output of the Gate Evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateEvaluation {
    /// Raw signals.
    pub signals: GateSignals,
    /// Derived state.
    pub state: CommitmentState,
    /// Unsatisfied gates, in gate order.
    pub missing_commitments: Vec<String>,
}

/// Target classification booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The narrow classification holds.
    pub annex: bool,
    /// The top-level classification holds.
    pub high_risk: bool,
}

/// Runs the gate and classification queries.
pub struct GateEvaluator<'a> {
    service: &'a dyn QueryService,
    annex: Query,
    high_risk: Query,
    capability: Query,
    intended_use: Query,
    use_scenario: Query,
    documentation: Query,
    capability_signal: Query,
    legacy_capability_signal: Query,
}

impl<'a> GateEvaluator<'a> {
    /// Parses the fixed query set.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::Query`] if a fixed query does not parse.
    pub fn new(service: &'a dyn QueryService) -> Result<Self> {
        let parse = |body: &str| Query::parse(&format!("{PROLOGUE}{body}"));
        Ok(Self {
            service,
            annex: parse(ANNEX)?,
            high_risk: parse(HIGH_RISK)?,
            capability: parse(CAPABILITY)?,
            intended_use: parse(INTENDED_USE)?,
            use_scenario: parse(USE_SCENARIO)?,
            documentation: parse(DOCUMENTATION)?,
            capability_signal: parse(CAPABILITY_SIGNAL)?,
            legacy_capability_signal: parse(LEGACY_CAPABILITY_SIGNAL)?,
        })
    }

    fn ask(&self, graph: &Graph, query: &Query, system: &Term) -> Result<bool> {
        let bound = query.clone().with_binding("system", system.clone())?;
        self.service.ask(graph, &bound)
    }

    /// Evaluates only the two classification queries.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::Query`] if evaluation fails.
    pub fn classify(&self, graph: &Graph, system: &Term) -> Result<Classification> {
        Ok(Classification {
            annex: self.ask(graph, &self.annex, system)?,
            high_risk: self.ask(graph, &self.high_risk, system)?,
        })
    }

    /// True if the top-level classification is stated in `graph`. Run
    /// against the Asserted Graph to tell asserted from inferred.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::Query`] if evaluation fails.
    pub fn high_risk_asserted(&self, asserted: &Graph, system: &Term) -> Result<bool> {
        self.ask(asserted, &self.high_risk, system)
    }

    /// Evaluates every signal and derives the state.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::Query`] if evaluation fails.
    pub fn evaluate(&self, reasoned: &Graph, system: &Term) -> Result<GateEvaluation> {
        let classification = self.classify(reasoned, system)?;
        let signals = GateSignals {
            annex_entailed: classification.annex,
            high_risk_entailed: classification.high_risk,
            capability: self.ask(reasoned, &self.capability, system)?,
            intended_use: self.ask(reasoned, &self.intended_use, system)?,
            use_scenario: self.ask(reasoned, &self.use_scenario, system)?,
            documentation: self.ask(reasoned, &self.documentation, system)?,
            capability_signal: self.ask(reasoned, &self.capability_signal, system)?
                || self.ask(reasoned, &self.legacy_capability_signal, system)?,
        };
        let state = signals.commitment_state();
        debug!(?signals, "gate signals");
        info!(system = %system.short_name(), %state, "gates evaluated");
        Ok(GateEvaluation {
            signals,
            state,
            missing_commitments: signals.missing_commitments(),
        })
    }
}
