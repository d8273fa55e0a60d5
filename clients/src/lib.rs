//! Shared plumbing for the ARCO client binaries: logging setup and the
//! profile/source selection flags both binaries accept.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use arco_engine::{vocab, FactSource, Profile, ProfileSet};
use clap::Args;
use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

/// Which system to evaluate and against which facts.
#[derive(Debug, Args)]
pub struct SelectionArgs {
    /// Profile table.
    #[arg(long, default_value = "profiles.toml")]
    pub profiles: PathBuf,

    /// Profile name.
    #[arg(long, default_value = "sentinel")]
    pub profile: String,

    /// Fact source; repeat to merge several. Replaces the profile's sources.
    #[arg(long = "data", value_name = "PATH")]
    pub data: Vec<PathBuf>,

    /// Target system IRI or CURIE. Replaces the profile's system.
    #[arg(long, value_name = "IRI|CURIE")]
    pub system: Option<String>,

    /// Debug-level logging.
    #[arg(long, short)]
    pub verbose: bool,
}

/// The selection after profile lookup and overrides.
#[derive(Debug, Clone)]
pub struct Selection {
    /// The profile the selection started from.
    pub profile: Profile,
    /// Target system IRI.
    pub system: String,
    /// Fact sources.
    pub sources: Vec<FactSource>,
}

impl SelectionArgs {
    /// Loads the profile table and applies `--data` and `--system`.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile table cannot be read, the profile is
    /// unknown or the system override is not a valid IRI or CURIE.
    pub fn resolve(&self) -> Result<Selection> {
        let set = ProfileSet::load(&self.profiles)
            .with_context(|| format!("Failed to load profiles: {}", self.profiles.display()))?;
        let profile = set.get(&self.profile)?.clone();
        let system = match &self.system {
            Some(system) => vocab::expand_curie(system)
                .with_context(|| format!("Invalid --system: {system}"))?,
            None => profile.system.clone(),
        };
        let sources = if self.data.is_empty() {
            profile.sources.iter().cloned().map(FactSource::File).collect()
        } else {
            self.data.iter().cloned().map(FactSource::File).collect()
        };
        Ok(Selection {
            profile,
            system,
            sources,
        })
    }
}
