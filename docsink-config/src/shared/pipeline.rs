use serde::{Deserialize, Serialize};

use crate::shared::{HierarchyConfig, SnapshotConfig, ValidationError};

/// Configuration of a denormalization pipeline.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Identifier of the pipeline, attached to every log line it emits.
    pub id: u64,
    /// Reconciliation engine settings.
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    /// Optional snapshot persistence. Without it every start is a cold start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotConfig>,
}

impl PipelineConfig {
    /// Validates pipeline settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.hierarchy.validate()?;

        if let Some(snapshot) = &self.snapshot {
            snapshot.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn rejects_zero_snapshot_interval() {
        let config = PipelineConfig {
            id: 1,
            hierarchy: HierarchyConfig::default(),
            snapshot: Some(SnapshotConfig {
                directory: PathBuf::from("/tmp/docsink"),
                save_every: 0,
            }),
        };

        assert!(config.validate().is_err());
    }
}
