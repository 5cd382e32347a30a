use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the replicator reads CDC envelopes from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    /// One JSON envelope per line, read from `path` or from stdin when unset.
    JsonLines {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::JsonLines { path: None }
    }
}
