use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::shared::ValidationError;

/// Settings for persisting the in-memory hierarchy between restarts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SnapshotConfig {
    /// Directory holding the organization and division snapshot files.
    pub directory: PathBuf,
    /// Number of processed changes between two snapshot writes.
    ///
    /// A final snapshot is always written when the pipeline stops.
    #[serde(default = "default_save_every")]
    pub save_every: u64,
}

impl SnapshotConfig {
    /// Default number of changes between snapshot writes.
    pub const DEFAULT_SAVE_EVERY: u64 = 1;

    /// Validates snapshot settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.save_every == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "pipeline.snapshot.save_every".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn default_save_every() -> u64 {
    SnapshotConfig::DEFAULT_SAVE_EVERY
}
