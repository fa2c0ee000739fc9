//! Thin CLI entry point. Output formatting and the query surface are out
//! of scope (spec §1) — this wires the orchestrator up for scripted and
//! CI use: run an indexing pass against a project root and exit non-zero
//! on failure.

use clap::Parser;
use roam::orchestrator::Orchestrator;
use roam::Settings;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

#[derive(Parser, Debug)]
#[command(name = "roam", about = "Multi-language code intelligence indexer")]
struct Cli {
    /// Project root to index. Defaults to the current directory.
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Discard any existing index and rebuild from scratch.
    #[arg(long)]
    force: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let root = match cli.path.canonicalize() {
        Ok(root) => root,
        Err(e) => {
            eprintln!("roam: cannot resolve path '{}': {e}", cli.path.display());
            return ExitCode::FAILURE;
        }
    };

    let settings = match Settings::load(&root) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("roam: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    roam::logging::init_with_config(&settings.logging);

    let orchestrator = Orchestrator::new(root, settings);
    let cancel = AtomicBool::new(false);
    match orchestrator.run(cli.force, &cancel) {
        Ok(summary) => {
            tracing::info!(?summary, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("roam: indexing run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
