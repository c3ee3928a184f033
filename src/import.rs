//! Directory import
//!
//! Loads a directory from the local filesystem into a project of a
//! [`MemoryTreeStore`] and checks the result in as a new revision.

use crate::error::ImportError;
use crate::store::{MemoryTreeStore, TreeStore};
use crate::tree::{resolve, LogicalPath};
use crate::types::{NodeId, NodeKind, Revision};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of one import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub project: String,
    pub revision: Revision,
    pub folders: usize,
    pub resources: usize,
}

/// Replace the contents of the project at `project_path` with the tree under
/// `source` and check it in.
///
/// Missing parent folders are created. A project that does not exist yet is
/// created with an empty check-in first, so the imported state is never the
/// project's first revision. Symbolic links and entries whose names are not
/// UTF-8 are skipped.
pub fn import_directory(
    store: &MemoryTreeStore,
    source: &Path,
    project_path: &str,
    author: &str,
    comment: Option<&str>,
) -> Result<ImportSummary, ImportError> {
    if !source.is_dir() {
        return Err(ImportError::InvalidTarget(format!(
            "'{}' is not a directory",
            source.display()
        )));
    }
    let path = LogicalPath::parse(project_path);
    let Some(name) = path.name() else {
        return Err(ImportError::InvalidTarget(
            "cannot import into the repository root".to_string(),
        ));
    };

    let root = store.root()?;
    let parent = resolve(store, root, &path.parent(), true)?.ok_or_else(|| {
        ImportError::InvalidTarget(format!("cannot create parent of '{}'", path))
    })?;
    let project = open_project(store, parent, name, author)?;

    for child in store.children(project)? {
        store.remove_node(child)?;
    }

    let mut summary = ImportSummary {
        project: path.to_string(),
        revision: 0,
        folders: 0,
        resources: 0,
    };
    let mut folders: HashMap<PathBuf, NodeId> = HashMap::new();
    folders.insert(PathBuf::new(), project);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.path_is_symlink() {
            debug!(path = %entry.path().display(), "Skipping symbolic link");
            continue;
        }
        let relative = entry.path().strip_prefix(source).map_err(|_| {
            ImportError::InvalidTarget(format!("'{}' escapes the source", entry.path().display()))
        })?;
        let Some(name) = entry.file_name().to_str() else {
            warn!(path = %entry.path().display(), "Skipping entry with a non UTF-8 name");
            continue;
        };
        let parent_rel = relative.parent().unwrap_or_else(|| Path::new(""));
        let Some(&parent) = folders.get(parent_rel) else {
            // Inside a directory that was skipped
            continue;
        };

        if entry.file_type().is_dir() {
            let node = store.add_child(parent, name, NodeKind::Folder)?;
            folders.insert(relative.to_path_buf(), node);
            summary.folders += 1;
        } else if entry.file_type().is_file() {
            let node = store.add_child(parent, name, NodeKind::Resource)?;
            store.set_content(node, std::fs::read(entry.path())?)?;
            summary.resources += 1;
        }
    }

    store.save(project)?;
    summary.revision = store.checkin(project, author, comment)?;
    info!(
        project = %summary.project,
        revision = summary.revision,
        folders = summary.folders,
        resources = summary.resources,
        "Imported directory"
    );
    Ok(summary)
}

/// Existing project named `name` under `parent`, or a new one with an empty
/// first revision
fn open_project(
    store: &MemoryTreeStore,
    parent: NodeId,
    name: &str,
    author: &str,
) -> Result<NodeId, ImportError> {
    if let Some(existing) = store.child(parent, name)? {
        if store.kind(existing)? != NodeKind::Project {
            return Err(ImportError::InvalidTarget(format!(
                "'{}' exists and is not a project",
                name
            )));
        }
        return Ok(existing);
    }
    let project = store.add_child(parent, name, NodeKind::Project)?;
    store.save(parent)?;
    store.checkin(project, author, None)?;
    debug!(name, "Created project");
    Ok(project)
}
