//! Flat repository over a tree store.

use super::contract::{Features, FileItem, Repository};
use crate::archive::{ArchiveOptions, ArchiveSerializer};
use crate::error::{ApiError, StoreError};
use crate::history;
use crate::store::TreeStore;
use crate::tree::{classify, resolve, summarize, Artifact, FileData, Folder, LogicalPath};
use crate::watch::{BridgeConfig, ChangeEventBridge, ChangeListener};
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

/// Top-level folder whose listing is flattened one level deeper
pub const DEPLOY_FOLDER: &str = "deploy";

/// Options for [`FlatRepository`]
#[derive(Debug, Clone, Default)]
pub struct RepositoryOptions {
    pub archive: ArchiveOptions,
    pub bridge: BridgeConfig,
}

/// Read-only, path-addressed view of a [`TreeStore`].
///
/// Every call walks the tree again; nothing is cached between calls.
pub struct FlatRepository {
    store: Arc<dyn TreeStore>,
    bridge: ChangeEventBridge,
    options: RepositoryOptions,
}

impl FlatRepository {
    /// Create the repository and start listening for store changes
    pub fn new(store: Arc<dyn TreeStore>, options: RepositoryOptions) -> Result<Self, ApiError> {
        let bridge = ChangeEventBridge::new(options.bridge.clone());
        bridge.activate(Arc::clone(&store))?;
        info!("Flat repository opened");
        Ok(Self {
            store,
            bridge,
            options,
        })
    }

    /// Clear the listener and stop the change bridge. Safe to call repeatedly.
    pub fn close(&self) {
        self.bridge.set_listener(None);
        self.bridge.deactivate();
    }

    fn resolve_artifact(&self, path: &LogicalPath) -> Result<Option<Artifact>, StoreError> {
        let root = self.store.root()?;
        match resolve(self.store.as_ref(), root, path, false)? {
            Some(node) => classify(self.store.as_ref(), node, path.clone()),
            None => Ok(None),
        }
    }

    /// Folder at `path`; missing paths and resources yield `None`
    fn resolve_folder(&self, path: &LogicalPath) -> Result<Option<Folder>, ApiError> {
        let artifact = self
            .resolve_artifact(path)
            .map_err(|e| ApiError::store(format!("Failed to get an artifact '{}'", path), e))?;
        Ok(artifact.and_then(Artifact::into_folder))
    }

    fn summarize(&self, name: &str, artifact: &Artifact) -> Result<FileData, ApiError> {
        summarize(self.store.as_ref(), name, artifact)
            .map_err(|e| ApiError::store(format!("Failed to read properties of '{}'", name), e))
    }

    fn item(&self, name: &str, artifact: &Artifact) -> Result<FileItem, ApiError> {
        let data = self.summarize(name, artifact)?;
        let content = match artifact {
            Artifact::Folder(folder) => {
                ArchiveSerializer::new(self.store.as_ref(), self.options.archive)
                    .serialize(folder)
                    .map_err(|e| ApiError::archive(format!("Failed to archive '{}'", name), e))?
            }
            Artifact::Resource(resource) => {
                let mut content = Vec::new();
                resource
                    .open(self.store.as_ref())
                    .and_then(|mut stream| {
                        stream.read_to_end(&mut content)?;
                        Ok(())
                    })
                    .map_err(|e| ApiError::store(format!("Failed to read '{}'", name), e))?;
                content
            }
        };
        Ok(FileItem { data, content })
    }

    /// Summaries of `folders`, skipping any child whose properties cannot be read
    fn summarize_children(&self, prefix: &LogicalPath, folders: Vec<Folder>, out: &mut Vec<FileData>) {
        for folder in folders {
            let name = prefix.join(&folder.name).to_string();
            match summarize(self.store.as_ref(), &name, &Artifact::Folder(folder)) {
                Ok(data) => out.push(data),
                Err(e) => debug!(name = %name, error = %e, "Failed to summarize a child folder"),
            }
        }
    }
}

impl Repository for FlatRepository {
    fn list(&self, path: &str) -> Result<Vec<FileData>, ApiError> {
        let path = LogicalPath::parse(path);
        let mut result = Vec::new();
        let Some(folder) = self.resolve_folder(&path)? else {
            return Ok(result);
        };
        let children = folder
            .child_folders(self.store.as_ref())
            .map_err(|e| ApiError::store(format!("Cannot get children of '{}'", path), e))?;

        if is_deploy_root(&path) {
            for deployment in children {
                let prefix = path.join(&deployment.name);
                match deployment.child_folders(self.store.as_ref()) {
                    Ok(grandchildren) => self.summarize_children(&prefix, grandchildren, &mut result),
                    Err(e) => debug!(deployment = %prefix, error = %e, "Failed to list a deployment"),
                }
            }
        } else {
            self.summarize_children(&path, children, &mut result);
        }
        Ok(result)
    }

    fn check(&self, name: &str) -> Result<Option<FileData>, ApiError> {
        let path = LogicalPath::parse(name);
        let artifact = self
            .resolve_artifact(&path)
            .map_err(|e| ApiError::store(format!("Failed to get an artifact '{}'", path), e))?;
        artifact
            .map(|artifact| self.summarize(&path.to_string(), &artifact))
            .transpose()
    }

    fn read(&self, name: &str) -> Result<Option<FileItem>, ApiError> {
        let path = LogicalPath::parse(name);
        let artifact = self
            .resolve_artifact(&path)
            .map_err(|e| ApiError::store(format!("Failed to get an artifact '{}'", path), e))?;
        artifact
            .map(|artifact| self.item(&path.to_string(), &artifact))
            .transpose()
    }

    fn save(&self, _data: &FileData, _content: &mut dyn Read) -> Result<FileData, ApiError> {
        Err(ApiError::UnsupportedOperation("save"))
    }

    fn save_batch(&self, _items: Vec<FileItem>) -> Result<Vec<FileData>, ApiError> {
        Err(ApiError::UnsupportedOperation("save"))
    }

    fn delete(&self, _data: &FileData) -> Result<bool, ApiError> {
        Err(ApiError::UnsupportedOperation("delete"))
    }

    fn list_history(&self, name: &str) -> Result<Vec<FileData>, ApiError> {
        let path = LogicalPath::parse(name);
        let Some(folder) = self.resolve_folder(&path)? else {
            return Ok(Vec::new());
        };
        history::list_history(self.store.as_ref(), &folder, &path.to_string())
            .map_err(|e| ApiError::store(format!("Failed to list history of '{}'", path), e))
    }

    fn check_history(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Option<FileData>, ApiError> {
        let Some(token) = version else {
            return self.check(name);
        };
        history::parse_version(token)?;
        let path = LogicalPath::parse(name);
        let Some(folder) = self.resolve_folder(&path)? else {
            return Ok(None);
        };
        let historic = history::resolve_version(self.store.as_ref(), &folder, Some(token))?;
        self.summarize(&path.to_string(), &Artifact::Folder(historic))
            .map(Some)
    }

    fn read_history(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Option<FileItem>, ApiError> {
        let Some(token) = version else {
            return self.read(name);
        };
        history::parse_version(token)?;
        let path = LogicalPath::parse(name);
        let Some(folder) = self.resolve_folder(&path)? else {
            return Ok(None);
        };
        let historic = history::resolve_version(self.store.as_ref(), &folder, Some(token))?;
        self.item(&path.to_string(), &Artifact::Folder(historic))
            .map(Some)
    }

    fn delete_history(&self, _data: &FileData) -> Result<bool, ApiError> {
        Err(ApiError::UnsupportedOperation("delete history"))
    }

    fn copy_history(
        &self,
        _src_name: &str,
        _dest: &FileData,
        _version: Option<&str>,
    ) -> Result<FileData, ApiError> {
        Err(ApiError::UnsupportedOperation("copy history"))
    }

    fn set_listener(&self, listener: Option<Arc<dyn ChangeListener>>) {
        self.bridge.set_listener(listener);
    }

    fn supports(&self) -> Features {
        Features {
            versions: true,
            mapped_folders: false,
            searchable: false,
        }
    }
}

/// `deploy` itself, not a path below it
fn is_deploy_root(path: &LogicalPath) -> bool {
    matches!(path.segments(), [only] if only == DEPLOY_FOLDER)
}

impl Drop for FlatRepository {
    fn drop(&mut self) {
        self.close();
    }
}
