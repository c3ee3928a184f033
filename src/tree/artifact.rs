//! Artifact classification
//!
//! Projects raw store nodes onto the two caller-facing shapes, folders and
//! resources. Lock markers are internal bookkeeping and never become
//! artifacts.

use super::path::LogicalPath;
use crate::error::StoreError;
use crate::store::TreeStore;
use crate::types::{props, NodeId, NodeKind, Revision};
use chrono::{DateTime, Utc};
use std::io::Read;
use tracing::{debug, error};

/// Classified view of a store node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Folder(Folder),
    Resource(Resource),
}

impl Artifact {
    pub fn node(&self) -> NodeId {
        match self {
            Artifact::Folder(folder) => folder.node,
            Artifact::Resource(resource) => resource.node,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Artifact::Folder(folder) => &folder.name,
            Artifact::Resource(resource) => &resource.name,
        }
    }

    pub fn path(&self) -> &LogicalPath {
        match self {
            Artifact::Folder(folder) => &folder.path,
            Artifact::Resource(resource) => &resource.path,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Artifact::Folder(folder) => Some(folder),
            Artifact::Resource(_) => None,
        }
    }

    pub fn into_folder(self) -> Option<Folder> {
        match self {
            Artifact::Folder(folder) => Some(folder),
            Artifact::Resource(_) => None,
        }
    }

    /// Version metadata read from the node's properties
    pub fn version_info(&self, store: &dyn TreeStore) -> Result<VersionInfo, StoreError> {
        VersionInfo::read(store, self.node())
    }
}

/// Folder-shaped artifact (plain folder or project)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub node: NodeId,
    pub name: String,
    pub path: LogicalPath,
}

impl Folder {
    /// Child artifacts in store order.
    ///
    /// Children that cannot be read or classified are logged and skipped; only
    /// a failure to enumerate this folder itself is returned.
    pub fn children(&self, store: &dyn TreeStore) -> Result<Vec<Artifact>, StoreError> {
        let mut result = Vec::new();
        for child in store.children(self.node)? {
            let name = match store.name(child) {
                Ok(name) => name,
                Err(e) => {
                    debug!(node = %child, error = %e, "Failed to get a child node");
                    continue;
                }
            };
            match classify(store, child, self.path.join(&name)) {
                Ok(Some(artifact)) => result.push(artifact),
                Ok(None) => {}
                Err(e) => {
                    debug!(node = %child, name = %name, error = %e, "Failed to classify a child node");
                }
            }
        }
        Ok(result)
    }

    /// Child folders only
    pub fn child_folders(&self, store: &dyn TreeStore) -> Result<Vec<Folder>, StoreError> {
        Ok(self
            .children(store)?
            .into_iter()
            .filter_map(Artifact::into_folder)
            .collect())
    }

    /// True when the folder has no visible children
    pub fn is_empty(&self, store: &dyn TreeStore) -> Result<bool, StoreError> {
        Ok(self.children(store)?.is_empty())
    }

    pub fn version_info(&self, store: &dyn TreeStore) -> Result<VersionInfo, StoreError> {
        VersionInfo::read(store, self.node)
    }

    /// Checked-in revisions in store order
    pub fn versions(&self, store: &dyn TreeStore) -> Result<Vec<Revision>, StoreError> {
        store.versions(self.node)
    }

    /// This folder as it was at `revision`; keeps the current name and path
    pub fn at_version(&self, store: &dyn TreeStore, revision: Revision) -> Result<Folder, StoreError> {
        let frozen = store.version(self.node, revision)?;
        Ok(Folder {
            node: frozen,
            name: self.name.clone(),
            path: self.path.clone(),
        })
    }
}

/// Leaf artifact with byte content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub node: NodeId,
    pub name: String,
    pub path: LogicalPath,
}

impl Resource {
    pub fn open(&self, store: &dyn TreeStore) -> Result<Box<dyn Read + Send>, StoreError> {
        store.open_content(self.node)
    }

    pub fn length(&self, store: &dyn TreeStore) -> Result<Option<u64>, StoreError> {
        store.content_length(self.node)
    }
}

/// Version metadata of a node at its current (or frozen) state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionInfo {
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub revision: Revision,
    pub comment: Option<String>,
    pub deleted: bool,
}

impl VersionInfo {
    /// Read from the well-known version properties; absent values stay unset
    pub fn read(store: &dyn TreeStore, node: NodeId) -> Result<Self, StoreError> {
        let author = store
            .property(node, props::VERSION_CREATED_BY)?
            .map(|value| value.as_string());
        let created_at = store
            .property(node, props::VERSION_CREATED_AT)?
            .and_then(|value| value.as_date());
        let revision = store
            .property(node, props::VERSION_REVISION)?
            .and_then(|value| value.as_long())
            .unwrap_or(0);
        let comment = store
            .property(node, props::VERSION_COMMENT)?
            .map(|value| value.as_string());
        let deleted = store.has_property(node, props::MARKED_FOR_DELETION)?;

        Ok(Self {
            author,
            created_at,
            revision,
            comment,
            deleted,
        })
    }
}

/// Classify `node`, found at `path`.
///
/// Lock markers yield `Ok(None)`: the caller treats them as absent.
pub fn classify(
    store: &dyn TreeStore,
    node: NodeId,
    path: LogicalPath,
) -> Result<Option<Artifact>, StoreError> {
    let kind = store.kind(node)?;
    let name = path.name().unwrap_or_default().to_string();
    match kind {
        NodeKind::Lock => {
            error!(node = %node, path = %path, "Incorrect node type: lock marker");
            Ok(None)
        }
        NodeKind::Resource => Ok(Some(Artifact::Resource(Resource { node, name, path }))),
        NodeKind::Folder | NodeKind::Project => {
            Ok(Some(Artifact::Folder(Folder { node, name, path })))
        }
    }
}
