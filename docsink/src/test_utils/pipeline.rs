use docsink_config::shared::{HierarchyConfig, PipelineConfig, SnapshotConfig};
use futures::Stream;
use futures::stream;
use std::path::Path;

use crate::error::DocSinkResult;
use crate::types::ChangeEnvelope;

/// Returns a pipeline configuration with default hierarchy settings and no snapshots.
pub fn test_pipeline_config(id: u64) -> PipelineConfig {
    PipelineConfig {
        id,
        hierarchy: HierarchyConfig::default(),
        snapshot: None,
    }
}

/// Returns a pipeline configuration that snapshots into `directory` after every change.
pub fn test_pipeline_config_with_snapshots(id: u64, directory: &Path) -> PipelineConfig {
    PipelineConfig {
        snapshot: Some(SnapshotConfig {
            directory: directory.to_path_buf(),
            save_every: 1,
        }),
        ..test_pipeline_config(id)
    }
}

/// Turns a list of envelopes into the stream consumed by a pipeline.
pub fn envelope_stream(
    envelopes: Vec<ChangeEnvelope>,
) -> impl Stream<Item = DocSinkResult<ChangeEnvelope>> {
    stream::iter(envelopes.into_iter().map(Ok))
}
