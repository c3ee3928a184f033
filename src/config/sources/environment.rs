//! Environment variable source: FLATREPO__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `FLATREPO__EVENTS__SLOW_LISTENER_MS=100` sets `events.slow_listener_ms`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("FLATREPO")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
