//! Summary records built from classified artifacts.

use super::Artifact;
use crate::error::StoreError;
use crate::store::TreeStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary record of one repository entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    /// Full logical path
    pub name: String,
    /// Byte size; `None` when it cannot be known without building the archive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Build the summary of `artifact`, reported under `name`.
///
/// An empty folder has size 0. A non-empty folder's size equals the archive
/// it would produce, so it is left unset.
pub fn summarize(
    store: &dyn TreeStore,
    name: &str,
    artifact: &Artifact,
) -> Result<FileData, StoreError> {
    let size = match artifact {
        Artifact::Folder(folder) => {
            if folder.is_empty(store)? {
                Some(0)
            } else {
                None
            }
        }
        Artifact::Resource(resource) => resource.length(store)?,
    };
    let info = artifact.version_info(store)?;

    Ok(FileData {
        name: name.to_string(),
        size,
        deleted: info.deleted,
        comment: info.comment,
        author: info.author,
        modified_at: info.created_at,
        version: Some(info.revision.to_string()),
    })
}
