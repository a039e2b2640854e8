//! jsconform unified CLI
//!
//! Differential conformance harness for JavaScript engines: runs a fixture
//! corpus against a configured engine, reconciles captured behavior with
//! inline expectations or the accepted baseline, and reports per category.
//!
//! Exit codes: 0 all pass/accepted-new, 1 one or more Fail/Regression
//! (Flaky too under --strict), 2 harness-internal error.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use commands::{accept, run};

#[derive(Parser)]
#[command(name = "jsconform")]
#[command(about = "Differential conformance harness for JavaScript engines", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute fixtures and reconcile against expectations or the baseline
    Run {
        /// Fixture files, directories, or globs (defaults to ".")
        paths: Vec<String>,
        /// Engine id from jsconform.toml
        #[arg(long)]
        engine: String,
        /// Per-fixture wall-clock budget in milliseconds
        #[arg(long)]
        timeout: Option<u64>,
        /// TOML mask rule file (extends or replaces the builtin rules)
        #[arg(long)]
        mask: Option<PathBuf>,
        /// Accept every new fixture and regression from this run
        #[arg(long)]
        update_baseline: bool,
        /// Treat flaky fixtures as failures
        #[arg(long)]
        strict: bool,
        /// Executions per fixture (flakiness detection when > 1)
        #[arg(long, default_value_t = 1)]
        repeat: usize,
        /// Worker pool size (0 = one per CPU)
        #[arg(long)]
        jobs: Option<usize>,
        /// Report format
        #[arg(long, default_value = "human")]
        reporter: String,
        /// Baseline store path (overrides config)
        #[arg(long)]
        baseline: Option<PathBuf>,
        /// Color output: auto, always, never
        #[arg(long, default_value = "auto")]
        color: String,
        /// Config file (defaults to the nearest jsconform.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Re-run one fixture and record its result as the accepted baseline
    Accept {
        /// Fixture id (path relative to the corpus root)
        fixture_id: String,
        /// Engine id from jsconform.toml
        #[arg(long)]
        engine: String,
        /// Corpus root the fixture id is relative to (defaults to ".")
        #[arg(long)]
        root: Option<PathBuf>,
        /// Per-fixture wall-clock budget in milliseconds
        #[arg(long)]
        timeout: Option<u64>,
        /// TOML mask rule file
        #[arg(long)]
        mask: Option<PathBuf>,
        /// Baseline store path (overrides config)
        #[arg(long)]
        baseline: Option<PathBuf>,
        /// Color output: auto, always, never
        #[arg(long, default_value = "auto")]
        color: String,
        /// Config file (defaults to the nearest jsconform.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            paths,
            engine,
            timeout,
            mask,
            update_baseline,
            strict,
            repeat,
            jobs,
            reporter,
            baseline,
            color,
            config,
        } => run::execute(run::RunArgs {
            paths,
            engine,
            timeout,
            mask,
            update_baseline,
            strict,
            repeat,
            jobs,
            reporter,
            baseline,
            color,
            config,
        }),

        Commands::Accept {
            fixture_id,
            engine,
            root,
            timeout,
            mask,
            baseline,
            color,
            config,
        } => accept::execute(accept::AcceptArgs {
            fixture_id,
            engine,
            root,
            timeout,
            mask,
            baseline,
            color,
            config,
        }),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
