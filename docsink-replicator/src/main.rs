//! Docsink replicator binary.
//!
//! Reads CDC envelopes for the organization, division and unit tables, denormalizes them into
//! organization documents and writes the resulting instructions to the configured destination.

use clap::Parser;
use docsink_config::shared::ReplicatorConfig;
use docsink_telemetry::tracing::init_tracing;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use crate::config::load_replicator_config;
use crate::core::start_replicator_with_config;
use crate::error::{ReplicatorError, ReplicatorResult};

mod config;
mod core;
mod error;
mod source;

/// Command line arguments of the replicator.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory holding `base.yaml` and the environment files. Defaults to `./configuration`.
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration, initializes tracing and runs the replicator on a multi-threaded runtime.
fn run(args: Args) -> ReplicatorResult<()> {
    let replicator_config = load_replicator_config(args.config_dir.as_deref())?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ReplicatorError::Runtime)?
        .block_on(async_main(replicator_config))?;

    Ok(())
}

async fn async_main(replicator_config: ReplicatorConfig) -> ReplicatorResult<()> {
    match start_replicator_with_config(replicator_config).await {
        Ok(stats) => {
            info!(
                processed = stats.processed,
                skipped = stats.skipped,
                failed = stats.failed,
                instructions = stats.instructions,
                "replicator stopped"
            );

            Ok(())
        }
        Err(err) => {
            error!("{err}");

            Err(err)
        }
    }
}
