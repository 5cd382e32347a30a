use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{DestinationConfig, PipelineConfig, SourceConfig, ValidationError};

/// Complete configuration of the replicator binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicatorConfig {
    /// Pipeline settings.
    pub pipeline: PipelineConfig,
    /// Source of CDC envelopes.
    #[serde(default)]
    pub source: SourceConfig,
    /// Destination of write instructions.
    pub destination: DestinationConfig,
}

impl ReplicatorConfig {
    /// Validates the complete replicator configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()
    }
}

impl Config for ReplicatorConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_configuration() {
        let config: ReplicatorConfig = serde_json::from_str(
            r#"{
                "pipeline": {"id": 7},
                "destination": {"json_lines": {}}
            }"#,
        )
        .unwrap();

        assert_eq!(config.pipeline.id, 7);
        assert_eq!(config.source, SourceConfig::JsonLines { path: None });
        assert_eq!(config.destination, DestinationConfig::JsonLines { path: None });
        assert!(config.pipeline.snapshot.is_none());
        assert_eq!(config.validate(), Ok(()));
    }
}
