//! Archive serialization
//!
//! Streams a folder subtree into a single zip archive. Entries are written
//! depth-first in store order with paths relative to the requested folder;
//! directories are implicit in entry names. Entry timestamps are pinned to the
//! zip epoch so an unchanged subtree always produces the same bytes.

use crate::error::ArchiveError;
use crate::store::TreeStore;
use crate::tree::{Artifact, Folder};
use serde::{Deserialize, Serialize};
use std::io::{self, Cursor, Seek, Write};
use tracing::{debug, trace};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entry compression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Stored,
    Deflated,
}

impl From<Compression> for CompressionMethod {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// Options for [`ArchiveSerializer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveOptions {
    pub compression: Compression,
}

/// Serializes folder artifacts into zip archives
pub struct ArchiveSerializer<'a> {
    store: &'a dyn TreeStore,
    options: ArchiveOptions,
}

impl<'a> ArchiveSerializer<'a> {
    pub fn new(store: &'a dyn TreeStore, options: ArchiveOptions) -> Self {
        Self { store, options }
    }

    /// Build the complete archive of `folder`.
    ///
    /// The returned bytes are a finished archive: every entry is closed and the
    /// central directory is written.
    pub fn serialize(&self, folder: &Folder) -> Result<Vec<u8>, ArchiveError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let children = folder.children(self.store)?;
        let entries = self.write_entries(children, &mut zip, "")?;
        let bytes = zip.finish()?.into_inner();
        debug!(
            path = %folder.path,
            entries,
            bytes = bytes.len(),
            "Serialized folder archive"
        );
        Ok(bytes)
    }

    fn entry_options(&self) -> FileOptions {
        FileOptions::default()
            .compression_method(self.options.compression.into())
            .last_modified_time(zip::DateTime::default())
    }

    /// Write `children` under `prefix`. A nested folder that cannot be
    /// enumerated is skipped; resource read failures abort the archive.
    fn write_entries<W: Write + Seek>(
        &self,
        children: Vec<Artifact>,
        zip: &mut ZipWriter<W>,
        prefix: &str,
    ) -> Result<usize, ArchiveError> {
        let mut entries = 0;
        for artifact in children {
            match artifact {
                Artifact::Resource(resource) => {
                    let entry_name = format!("{}{}", prefix, resource.name);
                    // Dropped at the end of this arm on success and on every `?`
                    let mut content = resource.open(self.store)?;
                    zip.start_file(entry_name.as_str(), self.entry_options())?;
                    let copied = io::copy(&mut content, zip)?;
                    trace!(entry = %entry_name, bytes = copied, "Wrote archive entry");
                    entries += 1;
                }
                Artifact::Folder(child) => {
                    let nested = match child.children(self.store) {
                        Ok(nested) => nested,
                        Err(e) => {
                            debug!(path = %child.path, error = %e, "Skipping unreadable folder");
                            continue;
                        }
                    };
                    let child_prefix = format!("{}{}/", prefix, child.name);
                    entries += self.write_entries(nested, zip, &child_prefix)?;
                }
            }
        }
        Ok(entries)
    }
}
