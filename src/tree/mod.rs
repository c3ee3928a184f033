//! Tree projection: logical path resolution and artifact classification.

pub mod artifact;
pub mod path;
pub mod summary;

pub use artifact::{classify, Artifact, Folder, Resource, VersionInfo};
pub use path::{resolve, LogicalPath};
pub use summary::{summarize, FileData};
