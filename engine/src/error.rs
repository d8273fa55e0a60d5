//! Engine error taxonomy.
//!
//! Fatal conditions are errors; expected outcomes (gate states, constraint
//! non-conformance, an unjustified classification) are data in the
//! [`DeterminationRecord`](crate::determination::DeterminationRecord).

use std::fmt;
use std::path::PathBuf;

/// Which kind of input a missing or unreadable source was meant to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A fact source (ontology or instance data).
    Facts,
    /// A shapes source for the constraint stage.
    Shapes,
    /// A profile table.
    Profiles,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Facts => "fact",
            SourceKind::Shapes => "shapes",
            SourceKind::Profiles => "profile",
        })
    }
}

/// Errors raised by the determination engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required fact, shapes or profile source does not exist.
    #[error("missing {kind} source: {}", path.display())]
    MissingSource {
        /// What the source was for.
        kind: SourceKind,
        /// The path that did not resolve.
        path: PathBuf,
    },

    /// A source exists but could not be parsed.
    #[error("failed to parse {source_name}: {message}")]
    Parse {
        /// Display name of the source (path or inline name).
        source_name: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A structural query is malformed or could not be evaluated.
    #[error("malformed query ({reason}):\n{query}")]
    Query {
        /// The query text as written.
        query: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The closure service cannot run.
    #[error("closure service unavailable: {reason}")]
    ClosureUnavailable {
        /// Why the service is unavailable.
        reason: String,
    },

    /// The closure service broke monotonicity by dropping asserted triples.
    #[error("closure service `{service}` removed {removed} asserted triple(s)")]
    ClosureContract {
        /// Name of the offending service.
        service: String,
        /// Number of asserted triples missing after expansion.
        removed: usize,
    },

    /// A shape uses a constraint the validator cannot interpret.
    #[error("malformed shape {shape}: {detail}")]
    MalformedShape {
        /// The shape node.
        shape: String,
        /// What is wrong with it.
        detail: String,
    },

    /// The system is classified but no evidence binding supports the classification.
    #[error("classification of {system} holds but no evidence path supports it (entailment_without_evidence)")]
    UnjustifiedClassification {
        /// The system under evaluation.
        system: String,
    },

    /// The ablation baseline does not entail both classifications.
    #[error(
        "ablation baseline invalid for {system}: narrow classification {annex}, top-level classification {high_risk}"
    )]
    AblationBaseline {
        /// The system under evaluation.
        system: String,
        /// Whether the narrow classification held.
        annex: bool,
        /// Whether the top-level classification held.
        high_risk: bool,
    },

    /// A designated ablation fact is absent from the freshly loaded graph.
    #[error("designated fact for gate `{gate}` is not asserted: {triple}")]
    AblationFactMissing {
        /// Gate the fact backs.
        gate: String,
        /// The fact in N-Triples form.
        triple: String,
    },

    /// A profile or run configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An artifact or source could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub(crate) fn query(query: &str, reason: impl Into<String>) -> Self {
        EngineError::Query {
            query: query.trim().to_owned(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
