//! Repository facade
//!
//! The public, flat surface over a hierarchical store: path-addressed
//! listing, summaries, content reads and history queries. Mutations are not
//! supported through this surface.

pub mod contract;
mod flat;

pub use crate::tree::FileData;
pub use contract::{Features, FileItem, Repository};
pub use flat::{FlatRepository, RepositoryOptions, DEPLOY_FOLDER};

use crate::archive::ArchiveOptions;
use crate::config::RepoConfig;
use crate::watch::BridgeConfig;
use std::time::Duration;

impl From<&RepoConfig> for RepositoryOptions {
    fn from(config: &RepoConfig) -> Self {
        Self {
            archive: ArchiveOptions {
                compression: config.archive.compression,
            },
            bridge: BridgeConfig {
                slow_listener: Duration::from_millis(config.events.slow_listener_ms),
            },
        }
    }
}
