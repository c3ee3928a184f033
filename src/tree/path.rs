//! Logical paths and the walk that resolves them against a tree store.

use crate::error::StoreError;
use crate::store::TreeStore;
use crate::types::{NodeId, NodeKind};
use std::fmt;
use tracing::debug;

/// Slash-separated caller address, stored as non-empty segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    /// The empty (root) path
    pub fn root() -> Self {
        Self::default()
    }

    /// Split `raw` on '/', dropping empty segments from leading, trailing or
    /// doubled slashes.
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final segment, if any
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> LogicalPath {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Child path; a `name` containing slashes contributes several segments
    pub fn join(&self, name: &str) -> LogicalPath {
        let mut segments = self.segments.clone();
        segments.extend(
            name.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        );
        Self { segments }
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl From<&str> for LogicalPath {
    fn from(raw: &str) -> Self {
        LogicalPath::parse(raw)
    }
}

/// Walk `path` down from `root`.
///
/// A missing segment yields `Ok(None)` unless `create_if_missing` is set, in
/// which case a `Folder` node is created, the parent and the new child are
/// saved, and the walk continues into it. Existing paths are never modified.
pub fn resolve(
    store: &dyn TreeStore,
    root: NodeId,
    path: &LogicalPath,
    create_if_missing: bool,
) -> Result<Option<NodeId>, StoreError> {
    let mut node = root;
    for segment in path.segments() {
        if let Some(child) = store.child(node, segment)? {
            node = child;
            continue;
        }
        if !create_if_missing {
            return Ok(None);
        }
        let created = store.add_child(node, segment, NodeKind::Folder)?;
        store.save(node)?;
        store.save(created)?;
        debug!(segment = %segment, path = %path, "Created missing folder");
        node = created;
    }
    Ok(Some(node))
}
