//! Tree Store
//!
//! Contract for the hierarchical, versioned content store the repository
//! projects. Nodes are addressed through opaque [`NodeId`] handles; change
//! notifications are pushed to subscribed listeners in batches.

pub mod memory;
pub mod persistence;

pub use memory::MemoryTreeStore;

use crate::error::StoreError;
use crate::types::{NodeId, NodeKind, PropertyValue, Revision};
use std::io::Read;
use std::sync::Arc;

/// Kind of a low-level change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodeAdded,
    NodeRemoved,
    PropertyAdded,
    PropertyChanged,
    PropertyRemoved,
}

impl EventKind {
    const fn bit(self) -> u8 {
        match self {
            EventKind::NodeAdded => EventTypes::NODE_ADDED.0,
            EventKind::NodeRemoved => EventTypes::NODE_REMOVED.0,
            EventKind::PropertyAdded => EventTypes::PROPERTY_ADDED.0,
            EventKind::PropertyChanged => EventTypes::PROPERTY_CHANGED.0,
            EventKind::PropertyRemoved => EventTypes::PROPERTY_REMOVED.0,
        }
    }
}

/// Bit set of [`EventKind`]s a subscriber wants to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTypes(u8);

impl EventTypes {
    pub const NODE_ADDED: EventTypes = EventTypes(1);
    pub const NODE_REMOVED: EventTypes = EventTypes(1 << 1);
    pub const PROPERTY_ADDED: EventTypes = EventTypes(1 << 2);
    pub const PROPERTY_CHANGED: EventTypes = EventTypes(1 << 3);
    pub const PROPERTY_REMOVED: EventTypes = EventTypes(1 << 4);
    pub const ALL: EventTypes = EventTypes(0b1_1111);

    pub const fn union(self, other: EventTypes) -> EventTypes {
        EventTypes(self.0 | other.0)
    }

    pub fn contains(self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }
}

/// One low-level change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub kind: EventKind,
    /// Absolute store path of the affected node ("/a/b")
    pub path: String,
    /// Kind of the affected node
    pub node_kind: NodeKind,
    /// Property name for property events
    pub property: Option<String>,
}

/// Subscription filter applied by the store before delivering a batch
#[derive(Debug, Clone)]
pub struct EventFilter {
    pub event_types: EventTypes,
    /// Absolute path the subscription is rooted at
    pub path: String,
    /// Whether events below `path` are delivered too
    pub deep: bool,
    /// Node kinds of interest; empty means any kind
    pub node_kinds: Vec<NodeKind>,
}

impl EventFilter {
    pub fn matches(&self, event: &StoreEvent) -> bool {
        if !self.event_types.contains(event.kind) {
            return false;
        }
        if !self.node_kinds.is_empty() && !self.node_kinds.contains(&event.node_kind) {
            return false;
        }
        self.matches_path(&event.path)
    }

    fn matches_path(&self, path: &str) -> bool {
        let root = self.path.trim_end_matches('/');
        if path == self.path || (root.is_empty() && path == "/") {
            return true;
        }
        if !self.deep {
            // Only direct children of the subscription root
            return match path.rsplit_once('/') {
                Some((parent, _)) => parent == root,
                None => false,
            };
        }
        path.starts_with(root) && path[root.len()..].starts_with('/')
    }
}

/// Receives batches of change notifications from a store
pub trait StoreListener: Send + Sync {
    fn on_event(&self, events: &[StoreEvent]);
}

/// Handle returned by [`TreeStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Backing store interface
///
/// Read access plus the minimal mutation needed to create missing folders
/// while resolving a path.
pub trait TreeStore: Send + Sync {
    fn root(&self) -> Result<NodeId, StoreError>;
    fn name(&self, node: NodeId) -> Result<String, StoreError>;
    fn kind(&self, node: NodeId) -> Result<NodeKind, StoreError>;

    /// Direct child by name
    fn child(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>, StoreError>;

    /// Direct children in store order
    fn children(&self, parent: NodeId) -> Result<Vec<NodeId>, StoreError>;

    /// Create a child node; it stays pending until `save` is called
    fn add_child(&self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId, StoreError>;

    /// Persist pending changes at or below `node` and deliver their events
    fn save(&self, node: NodeId) -> Result<(), StoreError>;

    fn property(&self, node: NodeId, name: &str) -> Result<Option<PropertyValue>, StoreError>;

    fn has_property(&self, node: NodeId, name: &str) -> Result<bool, StoreError> {
        Ok(self.property(node, name)?.is_some())
    }

    /// Open the byte content of a resource node
    fn open_content(&self, node: NodeId) -> Result<Box<dyn Read + Send>, StoreError>;

    /// Content length of a resource node, if known without reading it
    fn content_length(&self, node: NodeId) -> Result<Option<u64>, StoreError>;

    /// Checked-in revisions of a node in the store's native order
    fn versions(&self, node: NodeId) -> Result<Vec<Revision>, StoreError>;

    /// Frozen state of `node` at `revision`
    fn version(&self, node: NodeId, revision: Revision) -> Result<NodeId, StoreError>;

    fn subscribe(
        &self,
        listener: Arc<dyn StoreListener>,
        filter: EventFilter,
    ) -> Result<SubscriptionId, StoreError>;

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), StoreError>;

    /// Whether the store session is still usable
    fn is_live(&self) -> bool;
}
