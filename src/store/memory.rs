//! In-memory tree store
//!
//! Arena-backed implementation of [`TreeStore`]. Mutations queue change events
//! that are delivered as one batch per subscriber when the affected subtree is
//! saved. Check-ins copy the node's subtree into frozen, read-only nodes that
//! serve as historical versions.

use super::{EventFilter, EventKind, StoreEvent, StoreListener, SubscriptionId, TreeStore};
use crate::error::StoreError;
use crate::types::{props, NodeId, NodeKind, PropertyValue, Revision};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Stored node record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct NodeEntry {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) properties: BTreeMap<String, PropertyValue>,
    pub(crate) content: Option<Vec<u8>>,
    /// Part of a checked-in version; never modified
    pub(crate) frozen: bool,
    /// (revision, frozen copy) in check-in order
    pub(crate) versions: Vec<(Revision, NodeId)>,
}

impl NodeEntry {
    fn new(name: &str, kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            parent,
            children: Vec::new(),
            properties: BTreeMap::new(),
            content: None,
            frozen: false,
            versions: Vec::new(),
        }
    }
}

/// Node arena; the unit persisted by snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Arena {
    pub(crate) nodes: BTreeMap<NodeId, NodeEntry>,
    pub(crate) next_id: u64,
    pub(crate) root: NodeId,
}

impl Arena {
    fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(root, NodeEntry::new("", NodeKind::Folder, None));
        Self {
            nodes,
            next_id: 1,
            root,
        }
    }

    fn get(&self, id: NodeId) -> Result<&NodeEntry, StoreError> {
        self.nodes.get(&id).ok_or(StoreError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, StoreError> {
        self.nodes.get_mut(&id).ok_or(StoreError::NodeNotFound(id))
    }

    fn writable(&mut self, id: NodeId) -> Result<&mut NodeEntry, StoreError> {
        let entry = self.get_mut(id)?;
        if entry.frozen {
            return Err(StoreError::ReadOnlyNode(id));
        }
        Ok(entry)
    }

    fn allocate(&mut self, entry: NodeEntry) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, entry);
        id
    }

    /// Absolute path of a node ("/" for the root)
    fn path_of(&self, id: NodeId) -> Result<String, StoreError> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let entry = self.get(node_id)?;
            if entry.parent.is_some() || entry.frozen {
                segments.push(entry.name.clone());
            }
            current = entry.parent;
        }
        segments.reverse();
        Ok(format!("/{}", segments.join("/")))
    }

    /// Copy the subtree under `id` into frozen nodes and return the copy's root
    fn freeze_subtree(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<NodeId, StoreError> {
        let source = self.get(id)?.clone();
        let mut copy = NodeEntry::new(&source.name, source.kind, parent);
        copy.properties = source.properties;
        copy.content = source.content;
        copy.frozen = true;
        let copy_id = self.allocate(copy);

        let mut frozen_children = Vec::with_capacity(source.children.len());
        for child in source.children {
            frozen_children.push(self.freeze_subtree(child, Some(copy_id))?);
        }
        self.get_mut(copy_id)?.children = frozen_children;
        Ok(copy_id)
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) -> Result<(), StoreError> {
        out.push(id);
        for child in &self.get(id)?.children {
            self.collect_subtree(*child, out)?;
        }
        Ok(())
    }
}

struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    listener: Arc<dyn StoreListener>,
}

/// In-memory implementation of [`TreeStore`]
pub struct MemoryTreeStore {
    arena: RwLock<Arena>,
    pending: Mutex<Vec<StoreEvent>>,
    subscriptions: RwLock<Vec<Arc<Subscription>>>,
    next_subscription: AtomicU64,
    live: AtomicBool,
}

impl Default for MemoryTreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTreeStore {
    /// Create an empty store holding only the root folder
    pub fn new() -> Self {
        Self::from_arena(Arena::new())
    }

    pub(crate) fn from_arena(arena: Arena) -> Self {
        Self {
            arena: RwLock::new(arena),
            pending: Mutex::new(Vec::new()),
            subscriptions: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            live: AtomicBool::new(true),
        }
    }

    /// Copy of the arena for persistence
    pub(crate) fn snapshot(&self) -> Arena {
        self.arena.read().clone()
    }

    fn ensure_live(&self) -> Result<(), StoreError> {
        if self.live.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::SessionClosed)
        }
    }

    fn queue_event(&self, kind: EventKind, path: String, node_kind: NodeKind, property: Option<&str>) {
        trace!(?kind, path = %path, "Queued change event");
        self.pending.lock().push(StoreEvent {
            kind,
            path,
            node_kind,
            property: property.map(str::to_string),
        });
    }

    /// Set a property, queuing an added or changed event
    pub fn set_property(
        &self,
        node: NodeId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        self.ensure_live()?;
        let (path, kind, existed) = {
            let mut arena = self.arena.write();
            let entry = arena.writable(node)?;
            let existed = entry.properties.insert(name.to_string(), value).is_some();
            let kind = entry.kind;
            (arena.path_of(node)?, kind, existed)
        };
        let event = if existed {
            EventKind::PropertyChanged
        } else {
            EventKind::PropertyAdded
        };
        self.queue_event(event, path, kind, Some(name));
        Ok(())
    }

    /// Remove a property; returns whether it existed
    pub fn remove_property(&self, node: NodeId, name: &str) -> Result<bool, StoreError> {
        self.ensure_live()?;
        let (path, kind, existed) = {
            let mut arena = self.arena.write();
            let entry = arena.writable(node)?;
            let existed = entry.properties.remove(name).is_some();
            let kind = entry.kind;
            (arena.path_of(node)?, kind, existed)
        };
        if existed {
            self.queue_event(EventKind::PropertyRemoved, path, kind, Some(name));
        }
        Ok(existed)
    }

    /// Replace the byte content of a resource node
    pub fn set_content(&self, node: NodeId, content: Vec<u8>) -> Result<(), StoreError> {
        self.ensure_live()?;
        let (path, existed) = {
            let mut arena = self.arena.write();
            let entry = arena.writable(node)?;
            if entry.kind != NodeKind::Resource {
                return Err(StoreError::NoContent(node));
            }
            let existed = entry.content.replace(content).is_some();
            (arena.path_of(node)?, existed)
        };
        let event = if existed {
            EventKind::PropertyChanged
        } else {
            EventKind::PropertyAdded
        };
        self.queue_event(event, path, NodeKind::Resource, Some("content"));
        Ok(())
    }

    /// Remove a node and its subtree
    pub fn remove_node(&self, node: NodeId) -> Result<(), StoreError> {
        self.ensure_live()?;
        let removed = {
            let mut arena = self.arena.write();
            if node == arena.root {
                return Err(StoreError::ReadOnlyNode(node));
            }
            let parent = arena.writable(node)?.parent;

            let mut subtree = Vec::new();
            arena.collect_subtree(node, &mut subtree)?;
            let mut removed = Vec::with_capacity(subtree.len());
            for id in &subtree {
                let entry = arena.get(*id)?;
                removed.push((arena.path_of(*id)?, entry.kind));
            }
            for id in &subtree {
                arena.nodes.remove(id);
            }
            if let Some(parent) = parent {
                arena.get_mut(parent)?.children.retain(|c| *c != node);
            }
            removed
        };
        for (path, kind) in removed {
            self.queue_event(EventKind::NodeRemoved, path, kind, None);
        }
        Ok(())
    }

    /// Check in a versionable node at the current time
    pub fn checkin(
        &self,
        node: NodeId,
        author: &str,
        comment: Option<&str>,
    ) -> Result<Revision, StoreError> {
        self.checkin_at(node, author, comment, Utc::now())
    }

    /// Check in a versionable node: stamp its version properties, snapshot the
    /// subtree, and save it. Revisions count from 0 per node.
    pub fn checkin_at(
        &self,
        node: NodeId,
        author: &str,
        comment: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Revision, StoreError> {
        self.ensure_live()?;
        let revision = {
            let arena = self.arena.read();
            let entry = arena.get(node)?;
            if entry.kind != NodeKind::Project || entry.frozen {
                return Err(StoreError::NotVersionable(node));
            }
            entry.versions.last().map(|(rev, _)| rev + 1).unwrap_or(0)
        };

        self.set_property(node, props::VERSION_REVISION, PropertyValue::Long(revision))?;
        self.set_property(
            node,
            props::VERSION_CREATED_BY,
            PropertyValue::String(author.to_string()),
        )?;
        self.set_property(node, props::VERSION_CREATED_AT, PropertyValue::Date(at))?;
        match comment.filter(|c| !c.trim().is_empty()) {
            Some(comment) => self.set_property(
                node,
                props::VERSION_COMMENT,
                PropertyValue::String(comment.to_string()),
            )?,
            None => {
                self.remove_property(node, props::VERSION_COMMENT)?;
            }
        }

        {
            let mut arena = self.arena.write();
            let frozen = arena.freeze_subtree(node, None)?;
            arena.get_mut(node)?.versions.push((revision, frozen));
        }
        debug!(node = %node, revision, author, "Checked in node");

        self.save(node)?;
        Ok(revision)
    }

    /// Close the session; later calls fail with [`StoreError::SessionClosed`]
    pub fn close(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.subscriptions.write().clear();
            self.pending.lock().clear();
            debug!("Tree store session closed");
        }
    }

    /// Number of events queued and not yet delivered
    pub fn pending_events(&self) -> usize {
        self.pending.lock().len()
    }

    fn take_pending_under(&self, path: &str) -> Vec<StoreEvent> {
        let prefix = path.trim_end_matches('/');
        let mut pending = self.pending.lock();
        let (taken, kept): (Vec<_>, Vec<_>) = pending.drain(..).partition(|event| {
            prefix.is_empty()
                || event.path == path
                || (event.path.starts_with(prefix) && event.path[prefix.len()..].starts_with('/'))
        });
        *pending = kept;
        taken
    }

    fn dispatch(&self, events: &[StoreEvent]) {
        if events.is_empty() {
            return;
        }
        let subscriptions: Vec<Arc<Subscription>> = self.subscriptions.read().clone();
        for subscription in subscriptions {
            let batch: Vec<StoreEvent> = events
                .iter()
                .filter(|event| subscription.filter.matches(event))
                .cloned()
                .collect();
            if batch.is_empty() {
                continue;
            }
            debug!(
                subscription = subscription.id.0,
                event_count = batch.len(),
                "Delivering change batch"
            );
            subscription.listener.on_event(&batch);
        }
    }
}

impl TreeStore for MemoryTreeStore {
    fn root(&self) -> Result<NodeId, StoreError> {
        self.ensure_live()?;
        Ok(self.arena.read().root)
    }

    fn name(&self, node: NodeId) -> Result<String, StoreError> {
        self.ensure_live()?;
        Ok(self.arena.read().get(node)?.name.clone())
    }

    fn kind(&self, node: NodeId) -> Result<NodeKind, StoreError> {
        self.ensure_live()?;
        Ok(self.arena.read().get(node)?.kind)
    }

    fn child(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>, StoreError> {
        self.ensure_live()?;
        let arena = self.arena.read();
        for child in &arena.get(parent)?.children {
            if arena.get(*child)?.name == name {
                return Ok(Some(*child));
            }
        }
        Ok(None)
    }

    fn children(&self, parent: NodeId) -> Result<Vec<NodeId>, StoreError> {
        self.ensure_live()?;
        Ok(self.arena.read().get(parent)?.children.clone())
    }

    fn add_child(&self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId, StoreError> {
        self.ensure_live()?;
        if name.is_empty() || name.contains('/') {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let (id, path) = {
            let mut arena = self.arena.write();
            let siblings = arena.writable(parent)?.children.clone();
            for sibling in siblings {
                if arena.get(sibling)?.name == name {
                    return Err(StoreError::DuplicateChild {
                        parent,
                        name: name.to_string(),
                    });
                }
            }
            let id = arena.allocate(NodeEntry::new(name, kind, Some(parent)));
            arena.get_mut(parent)?.children.push(id);
            (id, arena.path_of(id)?)
        };
        self.queue_event(EventKind::NodeAdded, path, kind, None);
        Ok(id)
    }

    fn save(&self, node: NodeId) -> Result<(), StoreError> {
        self.ensure_live()?;
        let path = self.arena.read().path_of(node)?;
        let events = self.take_pending_under(&path);
        self.dispatch(&events);
        Ok(())
    }

    fn property(&self, node: NodeId, name: &str) -> Result<Option<PropertyValue>, StoreError> {
        self.ensure_live()?;
        Ok(self.arena.read().get(node)?.properties.get(name).cloned())
    }

    fn open_content(&self, node: NodeId) -> Result<Box<dyn Read + Send>, StoreError> {
        self.ensure_live()?;
        let arena = self.arena.read();
        let entry = arena.get(node)?;
        if entry.kind != NodeKind::Resource {
            return Err(StoreError::NoContent(node));
        }
        let bytes = entry.content.clone().unwrap_or_default();
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn content_length(&self, node: NodeId) -> Result<Option<u64>, StoreError> {
        self.ensure_live()?;
        let arena = self.arena.read();
        let entry = arena.get(node)?;
        if entry.kind != NodeKind::Resource {
            return Ok(None);
        }
        Ok(Some(entry.content.as_ref().map_or(0, |c| c.len() as u64)))
    }

    fn versions(&self, node: NodeId) -> Result<Vec<Revision>, StoreError> {
        self.ensure_live()?;
        let arena = self.arena.read();
        Ok(arena.get(node)?.versions.iter().map(|(rev, _)| *rev).collect())
    }

    fn version(&self, node: NodeId, revision: Revision) -> Result<NodeId, StoreError> {
        self.ensure_live()?;
        let arena = self.arena.read();
        arena
            .get(node)?
            .versions
            .iter()
            .find(|(rev, _)| *rev == revision)
            .map(|(_, frozen)| *frozen)
            .ok_or(StoreError::VersionNotFound { node, revision })
    }

    fn subscribe(
        &self,
        listener: Arc<dyn StoreListener>,
        filter: EventFilter,
    ) -> Result<SubscriptionId, StoreError> {
        self.ensure_live()?;
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.subscriptions.write().push(Arc::new(Subscription {
            id,
            filter,
            listener,
        }));
        debug!(subscription = id.0, "Listener subscribed");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), StoreError> {
        self.ensure_live()?;
        self.subscriptions.write().retain(|s| s.id != id);
        debug!(subscription = id.0, "Listener unsubscribed");
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}
