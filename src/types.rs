//! Core types shared by the store, the tree projection, and the repository facade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// NodeId: Opaque handle into a backing tree store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Revision: Integer identifier of a checked-in node state
pub type Revision = i64;

/// Node kind tag as stored by the backing tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Generic folder created while walking a path
    Folder,
    /// Versionable folder holding a project or deployment
    Project,
    /// Leaf node carrying byte content
    Resource,
    /// Internal lock marker; never surfaced to callers
    Lock,
}

impl NodeKind {
    /// Kinds that carry user-visible state (everything except lock markers)
    pub const COMMON_ENTITY: [NodeKind; 3] = [NodeKind::Folder, NodeKind::Project, NodeKind::Resource];
}

/// Property value attached to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Long(i64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl PropertyValue {
    /// String form of the value, as a store would coerce it
    pub fn as_string(&self) -> String {
        match self {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Long(v) => v.to_string(),
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Date(d) => d.to_rfc3339(),
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            PropertyValue::Long(v) => Some(*v),
            PropertyValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Date(d) => Some(*d),
            PropertyValue::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            _ => None,
        }
    }
}

/// Well-known property names read by the projection
pub mod props {
    pub const VERSION_CREATED_BY: &str = "versionCreatedBy";
    pub const VERSION_CREATED_AT: &str = "versionCreatedAt";
    pub const VERSION_REVISION: &str = "versionRevision";
    pub const VERSION_COMMENT: &str = "versionComment";
    pub const MARKED_FOR_DELETION: &str = "markedForDeletion";
}
