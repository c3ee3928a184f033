use crate::error::ApiError;
use crate::tree::FileData;
use crate::watch::ChangeListener;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

/// Summary plus content: a zip archive for folders, raw bytes for resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub data: FileData,
    pub content: Vec<u8>,
}

/// Capabilities advertised to the consuming layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub versions: bool,
    pub mapped_folders: bool,
    pub searchable: bool,
}

/// Flat, path-addressed repository contract.
///
/// Read operations return `Ok(None)` / empty lists when a path does not
/// exist. Implementations may reject the mutating operations.
pub trait Repository: Send + Sync {
    fn list(&self, path: &str) -> Result<Vec<FileData>, ApiError>;
    fn check(&self, name: &str) -> Result<Option<FileData>, ApiError>;
    fn read(&self, name: &str) -> Result<Option<FileItem>, ApiError>;
    fn save(&self, data: &FileData, content: &mut dyn Read) -> Result<FileData, ApiError>;
    fn save_batch(&self, items: Vec<FileItem>) -> Result<Vec<FileData>, ApiError>;
    fn delete(&self, data: &FileData) -> Result<bool, ApiError>;

    fn list_history(&self, name: &str) -> Result<Vec<FileData>, ApiError>;
    fn check_history(&self, name: &str, version: Option<&str>)
        -> Result<Option<FileData>, ApiError>;
    fn read_history(&self, name: &str, version: Option<&str>)
        -> Result<Option<FileItem>, ApiError>;
    fn delete_history(&self, data: &FileData) -> Result<bool, ApiError>;
    fn copy_history(
        &self,
        src_name: &str,
        dest: &FileData,
        version: Option<&str>,
    ) -> Result<FileData, ApiError>;

    /// Register (or clear) the single change observer
    fn set_listener(&self, listener: Option<Arc<dyn ChangeListener>>);

    fn supports(&self) -> Features;
}
