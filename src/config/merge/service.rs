//! MergeService: stacks config sources and deserializes into [`CatalogConfig`].

use crate::config::sources::{catalog_file, environment};
use crate::config::CatalogConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File};
use std::path::Path;

pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> catalog file -> explicit file -> environment (highest).
    pub fn load(catalog_root: &Path, explicit: Option<&Path>) -> Result<CatalogConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = catalog_file::add_to_builder(builder, catalog_root)?;
        let builder = match explicit {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Defaults -> `path` -> environment.
    pub fn load_from_file(path: &Path) -> Result<CatalogConfig, ConfigError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }
}

/// Seed the builder with the serialized defaults so every key exists for the
/// environment overlay to override.
fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&CatalogConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
