//! Error types for the store, archive, and repository layers.

use crate::types::{NodeId, Revision};
use thiserror::Error;

/// Errors raised by a backing tree store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Version {revision} not found for node {node}")]
    VersionNotFound { node: NodeId, revision: Revision },

    #[error("Store session is closed")]
    SessionClosed,

    #[error("Node {0} belongs to a frozen version and cannot be modified")]
    ReadOnlyNode(NodeId),

    #[error("Node {parent} already has a child named '{name}'")]
    DuplicateChild { parent: NodeId, name: String },

    #[error("Node {0} is not versionable")]
    NotVersionable(NodeId),

    #[error("Node {0} has no content")]
    NoContent(NodeId),

    #[error("Invalid node name: '{0}'")]
    InvalidName(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Persistence(format!("Snapshot encoding failed: {}", err))
    }
}

/// Errors raised while building an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Errors surfaced by the repository facade
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid version '{version}': version must be a number")]
    InvalidVersionFormat { version: String },

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(&'static str),

    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("{context}: {source}")]
    Archive {
        context: String,
        #[source]
        source: ArchiveError,
    },

    #[error("Change bridge error: {0}")]
    Bridge(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
}

impl ApiError {
    /// Wrap a store failure with the operation it interrupted
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        ApiError::Store {
            context: context.into(),
            source,
        }
    }

    pub fn archive(context: impl Into<String>, source: ArchiveError) -> Self {
        ApiError::Archive {
            context: context.into(),
            source,
        }
    }

    /// True when a well-formed version token named a revision the store does not have
    pub fn is_version_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::Store {
                source: StoreError::VersionNotFound { .. },
                ..
            }
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Errors raised while importing a directory into a store
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid import target: {0}")]
    InvalidTarget(String),
}
