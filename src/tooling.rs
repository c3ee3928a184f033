//! Tooling & Integration Layer
//!
//! Command-line surface over the repository and its output formatting.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands, OutputFormat};
