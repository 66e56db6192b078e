//! Config file stored in the catalog root: `metacat.toml`, `.yaml`, `.yml` or `.json`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

pub const FILE_STEM: &str = "metacat";

const EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// First existing config file in `catalog_root`, in extension order.
pub fn find(catalog_root: &Path) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| catalog_root.join(format!("{}.{}", FILE_STEM, ext)))
        .find(|path| path.is_file())
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    catalog_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(match find(catalog_root) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Using catalog config file");
            builder.add_source(File::from(path).required(true))
        }
        None => builder,
    })
}
