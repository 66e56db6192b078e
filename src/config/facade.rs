//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::CatalogConfig;
use config::ConfigError;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, the catalog's own config file if present, then environment.
    pub fn load(catalog_root: &Path) -> Result<CatalogConfig, ConfigError> {
        MergeService::load(catalog_root, None)
    }

    /// Like [`ConfigLoader::load`] with `path` layered above the catalog file.
    pub fn load_with_file(catalog_root: &Path, path: &Path) -> Result<CatalogConfig, ConfigError> {
        MergeService::load(catalog_root, Some(path))
    }

    /// Defaults, `path`, then environment.
    pub fn load_from_file(path: &Path) -> Result<CatalogConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    pub fn default() -> CatalogConfig {
        CatalogConfig::default()
    }
}
