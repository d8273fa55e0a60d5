//! `arco-ablation`: Proves each gate of a profile is independently necessary.
//!
//! Removes the profile's designated facts one at a time, re-runs closure
//! and classification on a fresh graph each time, and compares the result
//! with the expectation table.
//!
//! **Usage:**
//! ```text
//! arco-ablation [--profile <name>] [--data <path>]... [--system <iri>]
//! ```
//!
//! Exits non-zero unless every gate is load-bearing.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::process;

use anyhow::{bail, Context, Result};
use arco_clients::{init_tracing, SelectionArgs};
use arco_engine::{run_ablation, Engines, ReasonerKind};
use clap::Parser;

/// Run the gate ablation harness.
#[derive(Parser)]
#[command(
    name = "arco-ablation",
    about = "Verify that every gate of the determination is load-bearing"
)]
struct Args {
    #[command(flatten)]
    selection: SelectionArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.selection.verbose);

    let selection = args.selection.resolve()?;
    if selection.profile.ablation.is_empty() {
        bail!(
            "Profile `{}` has no ablation table",
            selection.profile.name
        );
    }

    let report = run_ablation(
        &selection.sources,
        &selection.system,
        &selection.profile.ablation,
        &Engines::builtin(ReasonerKind::OwlRl),
    )
    .with_context(|| format!("Ablation failed for {}", selection.system))?;

    print!("{}", report.render());

    if !report.all_passed() {
        eprintln!("Ablation FAILED: at least one gate is not independently necessary.");
        process::exit(1);
    }
    Ok(())
}
