use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the replicator sends document write instructions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfig {
    /// Keeps instructions and documents in memory.
    Memory,
    /// Writes one JSON instruction per line to `path`, or to stdout when unset.
    JsonLines {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
}
