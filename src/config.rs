//! Configuration
//!
//! Layered settings for the store location, archive output, change
//! notification and logging. See [`ConfigLoader`] for precedence.

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

use crate::archive::Compression;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Location of the persisted tree store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Platform data directory, falling back to a relative directory when the
/// platform has no home
fn default_store_path() -> PathBuf {
    directories::ProjectDirs::from("", "flatrepo", "flatrepo")
        .map(|dirs| dirs.data_dir().join("store"))
        .unwrap_or_else(|| PathBuf::from(".flatrepo").join("store"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub compression: Compression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Observer calls slower than this many milliseconds are logged
    #[serde(default = "default_slow_listener_ms")]
    pub slow_listener_ms: u64,
}

fn default_slow_listener_ms() -> u64 {
    500
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            slow_listener_ms: default_slow_listener_ms(),
        }
    }
}
