//! flatrepo: flat repository view over a versioned tree store
//!
//! Exposes a hierarchical, versioned content store as a flat, path-addressed
//! repository: folder listings, summaries, zip archives of folder subtrees,
//! version history, and coalesced change notifications.

pub mod archive;
pub mod config;
pub mod error;
pub mod history;
pub mod import;
pub mod logging;
pub mod repository;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod watch;
