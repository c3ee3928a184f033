//! MergeService: orchestrates sources, applies merge policy, deserializes to RepoConfig.

use super::merge_policy;
use crate::config::sources::{environment, file};
use crate::config::RepoConfig;
use config::ConfigError;
use std::path::Path;
use tracing::debug;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> config file -> environment (highest).
    pub fn load(config_file: Option<&Path>) -> Result<RepoConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = match config_file {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                file::add_to_builder(builder, path)?
            }
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        config.try_deserialize()
    }
}
