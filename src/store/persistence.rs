//! Sled-backed persistence for [`MemoryTreeStore`].
//!
//! The whole arena is stored as a single bincode value. Stores are small and
//! loaded once per process, so there is no incremental format.

use super::memory::{Arena, MemoryTreeStore};
use crate::error::StoreError;
use std::path::Path;
use tracing::{debug, info};

const ARENA_KEY: &[u8] = b"arena";

/// Snapshot database for a tree store
pub struct SledTreeSnapshot {
    db: sled::Db,
}

impl SledTreeSnapshot {
    /// Open (or create) the snapshot database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Load the stored tree, or an empty store when nothing was saved yet
    pub fn load(&self) -> Result<MemoryTreeStore, StoreError> {
        match self.db.get(ARENA_KEY)? {
            Some(bytes) => {
                let arena: Arena = bincode::deserialize(&bytes)?;
                info!(nodes = arena.nodes.len(), "Loaded tree snapshot");
                Ok(MemoryTreeStore::from_arena(arena))
            }
            None => {
                debug!("No tree snapshot found, starting with an empty store");
                Ok(MemoryTreeStore::new())
            }
        }
    }

    /// Persist the current state of `store`
    pub fn save(&self, store: &MemoryTreeStore) -> Result<(), StoreError> {
        let arena = store.snapshot();
        let bytes = bincode::serialize(&arena)?;
        self.db.insert(ARENA_KEY, bytes)?;
        self.db.flush()?;
        info!(nodes = arena.nodes.len(), "Saved tree snapshot");
        Ok(())
    }
}
