//! `arco-determine`: Runs one determination and writes its artifacts.
//!
//! Loads the selected profile's facts, runs closure, constraint checking,
//! evidence extraction and gate evaluation, and prints the report to
//! stdout. The JSON record, Turtle fragment and report are written to disk
//! only when their paths are given.
//!
//! **Usage:**
//! ```text
//! arco-determine [--profile <name>] [--data <path>]... [--system <iri>]
//!                [--record <path>] [--fragment <path>] [--report <path>]
//! ```
//!
//! Exits non-zero unless every check passed.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use arco_clients::{init_tracing, SelectionArgs};
use arco_engine::{
    run_determination, to_report, write_artifacts, ArtifactPaths, Engines, FactSource,
    ReasonerKind, RunConfig, Strictness,
};
use chrono::{SecondsFormat, Utc};
use clap::Parser;

/// Determine whether an AI system is high-risk, and why.
#[derive(Parser)]
#[command(
    name = "arco-determine",
    about = "Run an ARCO determination and write auditable artifacts"
)]
struct Args {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Shapes source. Replaces the profile's shapes.
    #[arg(long, value_name = "PATH")]
    shapes: Option<PathBuf>,

    /// Write the JSON record here.
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,

    /// Write the Turtle fragment here.
    #[arg(long, value_name = "PATH")]
    fragment: Option<PathBuf>,

    /// Write the text report here (always printed to stdout).
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Closure strictness: strict or lenient.
    #[arg(long, default_value = "strict")]
    strictness: Strictness,

    /// Closure service: owl-rl or none.
    #[arg(long, default_value = "owl-rl")]
    reasoner: ReasonerKind,

    /// Maximum evidence bindings kept in the record.
    #[arg(long, default_value_t = arco_engine::config::DEFAULT_EVIDENCE_CAP)]
    evidence_cap: usize,

    /// Source revision recorded in the run metadata.
    #[arg(long)]
    source_revision: Option<String>,

    /// Run timestamp, RFC 3339 (default: now).
    #[arg(long)]
    timestamp: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.selection.verbose);

    let selection = args.selection.resolve()?;
    let timestamp = args
        .timestamp
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    let mut config = RunConfig::from_profile(&selection.profile, timestamp)
        .with_strictness(args.strictness)
        .with_evidence_cap(args.evidence_cap)
        .with_source_revision(args.source_revision);
    config.system = selection.system;
    config.sources = selection.sources;
    if let Some(shapes) = args.shapes {
        config.shapes = FactSource::File(shapes);
    }

    let engines = Engines::builtin(args.reasoner);
    let record = run_determination(&config, &engines)
        .with_context(|| format!("Determination failed for {}", config.system))?;

    let paths = ArtifactPaths {
        record: args.record,
        fragment: args.fragment,
        report: args.report,
    };
    let written = write_artifacts(&record, &paths).context("Failed to write artifacts")?;

    print!("{}", to_report(&record));
    for path in &written {
        println!("Wrote {}", path.display());
    }

    if let Err(e) = record.ensure_justified() {
        eprintln!("Determination FAILED: {e}");
        process::exit(1);
    }
    if !record.all_checks_passed() {
        eprintln!(
            "Determination FAILED: {} check(s) did not pass.",
            record.checks().failure_count()
        );
        process::exit(1);
    }
    Ok(())
}
