//! Environment variable source: `METACAT__SECTION__KEY`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

pub const PREFIX: &str = "METACAT";

/// Add the environment overlay. The `__` separator keeps the logging variables
/// (`METACAT_LOG`, `METACAT_LOG_FORMAT`, ...) out of the config tree.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
