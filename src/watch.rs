//! Change notifications: store batches bridged to a single observer.

mod bridge;

pub use bridge::{BridgeConfig, ChangeEventBridge, ChangeListener};
