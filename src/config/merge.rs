//! Source composition and merge policy.

pub mod merge_policy;
pub mod service;
