use docsink::destination::Destination;
use docsink::destination::json_lines::JsonLinesDestination;
use docsink::destination::memory::MemoryDestination;
use docsink::pipeline::{Pipeline, PipelineStats};
use docsink::store::snapshot::SnapshotStore;
use docsink::store::snapshot::file::FileSnapshotStore;
use docsink::store::snapshot::memory::MemorySnapshotStore;
use docsink_config::shared::{
    DestinationConfig, PipelineConfig, ReplicatorConfig, SnapshotConfig, SourceConfig,
};
use tracing::{debug, info, warn};

use crate::error::ReplicatorResult;
use crate::source::{EnvelopeStream, open_source};

/// Starts the pipeline for `$destination` with the snapshot store picked from the configuration.
///
/// Expands to one monomorphized pipeline per snapshot store, keeping dispatch static.
macro_rules! run_with_destination {
    ($config:expr, $destination:expr, $envelopes:expr) => {
        match $config.snapshot.clone() {
            Some(snapshot) => {
                let snapshot_store = FileSnapshotStore::new(snapshot.directory);
                run_pipeline(Pipeline::new($config, snapshot_store, $destination), $envelopes).await
            }
            None => {
                let snapshot_store = MemorySnapshotStore::new();
                run_pipeline(Pipeline::new($config, snapshot_store, $destination), $envelopes).await
            }
        }
    };
}

/// Starts the replicator service with the provided configuration.
///
/// Opens the source, builds the destination and the snapshot store, and runs the pipeline
/// until the input ends or a shutdown signal arrives.
pub async fn start_replicator_with_config(
    replicator_config: ReplicatorConfig,
) -> ReplicatorResult<PipelineStats> {
    info!("starting replicator service");

    log_config(&replicator_config);

    let envelopes = open_source(&replicator_config.source).await?;
    let pipeline_config = replicator_config.pipeline;

    // Each destination gets its own pipeline type. This is more verbose due to static dispatch,
    // but avoids boxing every write.
    let stats = match &replicator_config.destination {
        DestinationConfig::Memory => {
            let destination = MemoryDestination::new();
            run_with_destination!(pipeline_config, destination, envelopes)?
        }
        DestinationConfig::JsonLines { path: None } => {
            let destination = JsonLinesDestination::stdout();
            run_with_destination!(pipeline_config, destination, envelopes)?
        }
        DestinationConfig::JsonLines { path: Some(path) } => {
            let destination = JsonLinesDestination::open(path).await?;
            run_with_destination!(pipeline_config, destination, envelopes)?
        }
    };

    info!("replicator service completed");

    Ok(stats)
}

fn log_config(config: &ReplicatorConfig) {
    log_source_config(&config.source);
    log_destination_config(&config.destination);
    log_pipeline_config(&config.pipeline);
}

fn log_source_config(config: &SourceConfig) {
    match config {
        SourceConfig::JsonLines { path } => {
            debug!(path = ?path, "using json lines source config");
        }
    }
}

fn log_destination_config(config: &DestinationConfig) {
    match config {
        DestinationConfig::Memory => {
            debug!("using memory destination config");
        }
        DestinationConfig::JsonLines { path } => {
            debug!(path = ?path, "using json lines destination config");
        }
    }
}

fn log_pipeline_config(config: &PipelineConfig) {
    debug!(
        pipeline_id = config.id,
        placeholder_id_threshold = config.hierarchy.placeholder_id_threshold,
        organization_table = config.hierarchy.tables.organization_table,
        division_table = config.hierarchy.tables.division_table,
        unit_table = config.hierarchy.tables.unit_table,
        "pipeline config"
    );
    if let Some(snapshot) = &config.snapshot {
        log_snapshot_config(snapshot);
    }
}

fn log_snapshot_config(config: &SnapshotConfig) {
    debug!(
        directory = %config.directory.display(),
        save_every = config.save_every,
        "snapshot config"
    );
}

/// Starts a pipeline and handles graceful shutdown signals.
///
/// Runs the pipeline over `envelopes` while listening for SIGINT and SIGTERM. A signal lets
/// the change in progress finish, then the pipeline snapshots its state and stops.
#[tracing::instrument(skip_all, fields(pipeline_id = pipeline.id()))]
async fn run_pipeline<S, D>(
    mut pipeline: Pipeline<S, D>,
    envelopes: EnvelopeStream,
) -> ReplicatorResult<PipelineStats>
where
    S: SnapshotStore + Send + Sync,
    D: Destination + Send + Sync,
{
    pipeline.start().await?;

    let shutdown_tx = pipeline.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        wait_for_signal().await;

        if let Err(err) = shutdown_tx.send(()) {
            warn!(error = ?err, "failed to send shutdown signal");
            return;
        }

        info!("pipeline shutdown requested");
    });

    let result = pipeline.run(envelopes).await;

    // The pipeline may have finished on its own, in which case nobody waits for a signal anymore.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    let stats = result?;

    Ok(stats)
}

/// Waits for SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("sigint (ctrl+c) received, shutting down pipeline");
                    }
                    _ = sigterm.recv() => {
                        info!("sigterm received, shutting down pipeline");
                    }
                }
                return;
            }
            Err(err) => {
                warn!(error = %err, "failed to register sigterm handler, listening for ctrl+c only");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("sigint (ctrl+c) received, shutting down pipeline"),
        Err(err) => warn!(error = %err, "failed to listen for ctrl+c"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsink::test_utils::envelope::{division_created, organization_created, unit_created};
    use docsink::test_utils::pipeline::test_pipeline_config;
    use std::path::Path;

    fn write_envelopes(path: &Path) {
        let lines: Vec<String> = [
            unit_created(1, "Lab", 5),
            division_created(5, "Research", 9),
            organization_created(9, "Org"),
        ]
        .iter()
        .map(|envelope| serde_json::to_string(envelope).unwrap())
        .collect();

        std::fs::write(path, lines.join("\n")).unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replicates_file_source_into_json_lines_file() {
        let temp = tempfile::tempdir().unwrap();
        let directory = temp.path();
        let input = directory.join("input.jsonl");
        let output = directory.join("output.jsonl");
        write_envelopes(&input);

        let config = ReplicatorConfig {
            pipeline: PipelineConfig {
                snapshot: Some(SnapshotConfig {
                    directory: directory.join("snapshot"),
                    save_every: 1,
                }),
                ..test_pipeline_config(3)
            },
            source: SourceConfig::JsonLines {
                path: Some(input.clone()),
            },
            destination: DestinationConfig::JsonLines {
                path: Some(output.clone()),
            },
        };

        let stats = start_replicator_with_config(config).await.unwrap();

        assert_eq!(stats.processed, 3);
        assert_eq!(stats.instructions, 3);

        let written = std::fs::read_to_string(&output).unwrap();
        let last: serde_json::Value =
            serde_json::from_str(written.lines().last().unwrap()).unwrap();
        assert_eq!(last["type"], "replace");
        assert_eq!(last["document"]["name"], "Org");
        assert_eq!(
            last["document"]["divisions"][0]["units"][0]["name"],
            "Lab"
        );
        assert!(directory.join("snapshot").join("organizations.json").exists());
    }
}
