//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::RepoConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, then `file` when given, then `FLATREPO__*` environment overrides.
    pub fn load(file: Option<&Path>) -> Result<RepoConfig, ConfigError> {
        MergeService::load(file)
    }

    /// Create default configuration.
    pub fn default() -> RepoConfig {
        RepoConfig::default()
    }
}
