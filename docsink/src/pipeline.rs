use docsink_config::shared::PipelineConfig;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::pin;
use tracing::{debug, error, info, warn};

use crate::bail;
use crate::concurrency::shutdown::{
    ShutdownResult, ShutdownRx, ShutdownTx, create_shutdown_channel,
};
use crate::destination::Destination;
use crate::error::{DocSinkError, DocSinkResult, ErrorKind};
use crate::handler::ChangeHandler;
use crate::store::HierarchyStore;
use crate::store::snapshot::SnapshotStore;
use crate::types::ChangeEnvelope;

pub type PipelineId = u64;

/// Counters of a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Changes that went through reconciliation.
    pub processed: u64,
    /// Envelopes that normalized to nothing: tombstones and unknown tables.
    pub skipped: u64,
    /// Envelopes that failed on their own and were dropped.
    pub failed: u64,
    /// Instructions handed to the destination.
    pub instructions: u64,
}

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started { handler: ChangeHandler },
}

/// Drives a stream of CDC envelopes through the hierarchy and into a [`Destination`].
#[derive(Debug)]
pub struct Pipeline<S, D> {
    id: PipelineId,
    config: Arc<PipelineConfig>,
    snapshot_store: S,
    destination: D,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
}

impl<S, D> Pipeline<S, D>
where
    S: SnapshotStore + Send + Sync,
    D: Destination + Send + Sync,
{
    pub fn new(config: PipelineConfig, snapshot_store: S, destination: D) -> Self {
        // Receivers are created on demand through `subscribe`.
        let (shutdown_tx, _) = create_shutdown_channel();

        Self {
            id: config.id,
            config: Arc::new(config),
            snapshot_store,
            destination,
            state: PipelineState::NotStarted,
            shutdown_tx,
        }
    }

    pub fn id(&self) -> PipelineId {
        self.id
    }

    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Returns the hierarchy store once the pipeline is started.
    pub fn store(&self) -> Option<&HierarchyStore> {
        match &self.state {
            PipelineState::Started { handler } => Some(handler.store()),
            PipelineState::NotStarted => None,
        }
    }

    /// Hydrates the hierarchy from the snapshot store.
    ///
    /// A missing or unreadable snapshot is not fatal: the pipeline starts with an empty
    /// hierarchy and rebuilds it from the stream.
    pub async fn start(&mut self) -> DocSinkResult<()> {
        if let PipelineState::Started { .. } = self.state {
            bail!(
                ErrorKind::InvalidState,
                "Pipeline already started",
                format!("pipeline {}", self.id)
            );
        }

        info!(pipeline_id = self.id, "starting pipeline");

        let store = match self.snapshot_store.load_snapshot().await {
            Ok(Some(snapshot)) => {
                info!(
                    pipeline_id = self.id,
                    organizations = snapshot.organizations.len(),
                    divisions = snapshot.divisions.len(),
                    "hydrated hierarchy from snapshot"
                );
                HierarchyStore::from_snapshot(snapshot)
            }
            Ok(None) => {
                info!(pipeline_id = self.id, "no snapshot found, starting cold");
                HierarchyStore::new()
            }
            Err(err) => {
                warn!(
                    pipeline_id = self.id,
                    error = %err,
                    "failed to load snapshot, starting cold"
                );
                HierarchyStore::new()
            }
        };

        let handler = ChangeHandler::new(&self.config.hierarchy, store);
        self.state = PipelineState::Started { handler };

        Ok(())
    }

    /// Processes `envelopes` until the stream ends, a shutdown is requested or the destination
    /// fails.
    ///
    /// Envelopes that fail on their own are logged and counted, and the run continues. On exit
    /// the hierarchy is snapshotted and the destination is shut down. When both the run and the
    /// shutdown fail, the returned error aggregates the two.
    pub async fn run<St>(&self, envelopes: St) -> DocSinkResult<PipelineStats>
    where
        St: Stream<Item = DocSinkResult<ChangeEnvelope>>,
    {
        let handler = match &self.state {
            PipelineState::Started { handler } => handler,
            PipelineState::NotStarted => bail!(
                ErrorKind::InvalidState,
                "Pipeline must be started before running",
                format!("pipeline {}", self.id)
            ),
        };

        pin!(envelopes);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let mut stats = PipelineStats::default();
        let mut since_snapshot = 0u64;
        let save_every = self.config.snapshot.as_ref().map(|snapshot| snapshot.save_every);

        let outcome: DocSinkResult<()> = loop {
            let envelope = match next_envelope(&mut envelopes, &mut shutdown_rx).await {
                ShutdownResult::Ok(Some(envelope)) => envelope,
                ShutdownResult::Ok(None) => {
                    info!(pipeline_id = self.id, "change stream ended");
                    break Ok(());
                }
                ShutdownResult::Shutdown(()) => {
                    info!(pipeline_id = self.id, "shutting down pipeline");
                    break Ok(());
                }
            };

            let emitted = match envelope.and_then(|envelope| handler.handle_envelope(&envelope)) {
                Ok(Some(emitted)) => emitted,
                Ok(None) => {
                    stats.skipped += 1;
                    continue;
                }
                Err(err) if err.kind().is_event_scoped() => {
                    error!(
                        pipeline_id = self.id,
                        kind = ?err.kind(),
                        error = %err,
                        "failed to handle change, skipping it"
                    );
                    stats.failed += 1;
                    continue;
                }
                Err(err) => break Err(err),
            };

            stats.processed += 1;

            if !emitted.is_empty() {
                stats.instructions += emitted.len() as u64;
                if let Err(err) = self
                    .destination
                    .write_instructions(emitted.into_instructions())
                    .await
                {
                    break Err(err);
                }
            }

            if let Some(save_every) = save_every {
                since_snapshot += 1;
                if since_snapshot >= save_every {
                    self.store_snapshot(handler).await;
                    since_snapshot = 0;
                }
            }
        };

        self.store_snapshot(handler).await;

        // The destination is shut down on every exit so that buffered writes are flushed.
        let mut errors = Vec::new();
        if let Err(err) = outcome {
            errors.push(err);
        }
        if let Err(err) = self.destination.shutdown().await {
            errors.push(err);
        }

        if !errors.is_empty() {
            let err = DocSinkError::from(errors);
            error!(
                pipeline_id = self.id,
                error = %err,
                "pipeline stopped on a failure"
            );
            return Err(err);
        }

        info!(
            pipeline_id = self.id,
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            instructions = stats.instructions,
            "pipeline finished"
        );

        Ok(stats)
    }

    /// Requests a running pipeline to stop after the change in progress.
    pub fn shutdown(&self) {
        if self.shutdown_tx.send(()).is_err() {
            debug!(pipeline_id = self.id, "pipeline is not running, nothing to shut down");
        }
    }

    async fn store_snapshot(&self, handler: &ChangeHandler) {
        let snapshot = handler.store().snapshot();

        if let Err(err) = self.snapshot_store.store_snapshot(snapshot).await {
            warn!(
                pipeline_id = self.id,
                error = %err,
                "failed to store snapshot"
            );
        }
    }
}

/// Waits for the next envelope unless a shutdown arrives first.
async fn next_envelope<St>(
    envelopes: &mut St,
    shutdown_rx: &mut ShutdownRx,
) -> ShutdownResult<Option<DocSinkResult<ChangeEnvelope>>, ()>
where
    St: Stream<Item = DocSinkResult<ChangeEnvelope>> + Unpin,
{
    tokio::select! {
        biased;

        _ = shutdown_rx.changed() => ShutdownResult::Shutdown(()),
        envelope = envelopes.next() => ShutdownResult::Ok(envelope),
    }
}
