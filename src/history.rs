//! Version history
//!
//! Enumerates the checked-in states of a folder artifact and resolves
//! caller-supplied version tokens to a frozen folder state.

use crate::error::{ApiError, StoreError};
use crate::store::TreeStore;
use crate::tree::{summarize, Artifact, FileData, Folder};
use crate::types::Revision;
use tracing::{debug, trace};

/// A check-in that carries no user-visible change: an empty state without a comment.
///
/// Only a known size of zero qualifies; a folder whose size is indeterminate
/// is never treated as technical.
pub fn is_technical_revision(data: &FileData) -> bool {
    data.size == Some(0)
        && data
            .comment
            .as_deref()
            .map_or(true, |comment| comment.trim().is_empty())
}

/// Summaries of every meaningful revision of `folder`, reported under `name`,
/// in the store's native version order.
pub fn list_history(
    store: &dyn TreeStore,
    folder: &Folder,
    name: &str,
) -> Result<Vec<FileData>, StoreError> {
    let versions = folder.versions(store)?;
    if versions.is_empty() {
        return Ok(Vec::new());
    }

    let mut result = Vec::with_capacity(versions.len());
    for revision in versions {
        let history = folder.at_version(store, revision)?;
        let data = summarize(store, name, &Artifact::Folder(history))?;
        if is_technical_revision(&data) {
            trace!(name, revision, "Skipping technical revision");
            continue;
        }
        result.push(data);
    }
    debug!(name, revisions = result.len(), "Listed history");
    Ok(result)
}

/// Parse a version token as an integer revision
pub fn parse_version(token: &str) -> Result<Revision, ApiError> {
    token
        .trim()
        .parse::<Revision>()
        .map_err(|_| ApiError::InvalidVersionFormat {
            version: token.to_string(),
        })
}

/// Folder state selected by `token`; `None` means the current state
pub fn resolve_version(
    store: &dyn TreeStore,
    folder: &Folder,
    token: Option<&str>,
) -> Result<Folder, ApiError> {
    let Some(token) = token else {
        return Ok(folder.clone());
    };
    let revision = parse_version(token)?;
    folder.at_version(store, revision).map_err(|e| {
        ApiError::store(
            format!("Failed to get version {} of '{}'", revision, folder.path),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTreeStore;
    use crate::tree::{classify, LogicalPath};
    use crate::types::{NodeId, NodeKind};

    fn project_with_history() -> (MemoryTreeStore, NodeId) {
        let store = MemoryTreeStore::new();
        let root = store.root().unwrap();
        let project = store.add_child(root, "p", NodeKind::Project).unwrap();
        store.save(root).unwrap();
        // 0: empty, no comment (technical)
        store.checkin(project, "system", None).unwrap();
        // 1: content, no comment
        let file = store.add_child(project, "a.txt", NodeKind::Resource).unwrap();
        store.set_content(file, b"a".to_vec()).unwrap();
        store.checkin(project, "alice", None).unwrap();
        // 2: emptied again but commented
        store.remove_node(file).unwrap();
        store.checkin(project, "bob", Some("cleanup")).unwrap();
        // 3: empty, blank comment (technical)
        store.checkin(project, "system", Some("   ")).unwrap();
        (store, project)
    }

    fn folder(store: &MemoryTreeStore, node: NodeId) -> Folder {
        classify(store, node, LogicalPath::parse("p"))
            .unwrap()
            .and_then(Artifact::into_folder)
            .unwrap()
    }

    #[test]
    fn test_technical_revision_predicate() {
        let mut data = FileData {
            size: Some(0),
            ..FileData::default()
        };
        assert!(is_technical_revision(&data));
        data.comment = Some("  ".to_string());
        assert!(is_technical_revision(&data));
        data.comment = Some("fix".to_string());
        assert!(!is_technical_revision(&data));
        data.comment = None;
        data.size = None;
        assert!(!is_technical_revision(&data));
    }

    #[test]
    fn test_list_history_filters_technical_revisions() {
        let (store, project) = project_with_history();
        let history = list_history(&store, &folder(&store, project), "p").unwrap();

        let versions: Vec<&str> = history
            .iter()
            .filter_map(|d| d.version.as_deref())
            .collect();
        assert_eq!(versions, vec!["1", "2"]);
        assert_eq!(history[0].author.as_deref(), Some("alice"));
        assert_eq!(history[0].size, None);
        assert_eq!(history[1].comment.as_deref(), Some("cleanup"));
        assert!(history.iter().all(|d| d.name == "p"));
    }

    #[test]
    fn test_list_history_without_versions() {
        let store = MemoryTreeStore::new();
        let root = store.root().unwrap();
        let plain = store.add_child(root, "p", NodeKind::Folder).unwrap();
        assert!(list_history(&store, &folder(&store, plain), "p")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_resolve_version_tokens() {
        let (store, project) = project_with_history();
        let current = folder(&store, project);

        assert_eq!(resolve_version(&store, &current, None).unwrap(), current);

        let v1 = resolve_version(&store, &current, Some("1")).unwrap();
        assert_ne!(v1.node, current.node);
        assert_eq!(v1.name, "p");
        assert_eq!(v1.children(&store).unwrap().len(), 1);

        let err = resolve_version(&store, &current, Some("abc")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidVersionFormat { .. }));
        assert!(err.to_string().contains("version must be a number"));

        let err = resolve_version(&store, &current, Some("9999999")).unwrap_err();
        assert!(err.is_version_not_found());
    }
}
