//! Merge policy: the built-in defaults every other source overrides.

use crate::config::RepoConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with [`RepoConfig::default`].
///
/// Seeding from the serialized defaults keeps a partial file or a single
/// environment variable from failing deserialization of the other keys.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&RepoConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
