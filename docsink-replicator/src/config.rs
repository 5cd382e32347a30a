use docsink_config::shared::ReplicatorConfig;
use docsink_config::{Environment, load_config, load_config_from_dir};
use std::path::Path;

use crate::error::{ReplicatorError, ReplicatorResult};

/// Loads and validates the replicator configuration.
///
/// Reads from `directory` when given, otherwise from `./configuration`.
pub fn load_replicator_config(directory: Option<&Path>) -> ReplicatorResult<ReplicatorConfig> {
    let config = match directory {
        Some(directory) => {
            let environment = Environment::load().map_err(ReplicatorError::config)?;
            load_config_from_dir::<ReplicatorConfig>(directory, environment)
        }
        None => load_config::<ReplicatorConfig>(),
    }
    .map_err(ReplicatorError::config)?;

    config.validate().map_err(ReplicatorError::config)?;

    Ok(config)
}
