//! Configuration
//!
//! Layered settings for one catalog, lowest precedence first: built-in defaults,
//! `<catalog>/metacat.{toml,yaml,json}`, an explicit `--config` file, then
//! `METACAT__SECTION__KEY` environment variables.

mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use crate::store::KeyDigest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a catalog run can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub lock: LockSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSection {
    /// Blob directory, relative to the catalog root.
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,

    #[serde(default)]
    pub key_digest: KeyDigest,

    /// Catalog schema version translators are matched against.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Extra mapping documents; relative paths resolve against the catalog root.
    #[serde(default)]
    pub translators_dir: Option<PathBuf>,
}

fn default_metadata_dir() -> PathBuf {
    PathBuf::from("metadata")
}

fn default_schema_version() -> String {
    "1.0.0".to_string()
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            metadata_dir: default_metadata_dir(),
            key_digest: KeyDigest::default(),
            schema_version: default_schema_version(),
            translators_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockSection {
    /// Hold an advisory lock file around each load → merge → store cycle.
    #[serde(default = "default_lock_enabled")]
    pub enabled: bool,
}

fn default_lock_enabled() -> bool {
    true
}

impl Default for LockSection {
    fn default() -> Self {
        Self {
            enabled: default_lock_enabled(),
        }
    }
}
