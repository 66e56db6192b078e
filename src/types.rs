//! Core types shared across the catalog engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical field names as they appear in catalog documents read by the browser UI.
pub mod fields {
    pub const TYPE: &str = "type";
    pub const DATASET_ID: &str = "dataset_id";
    pub const DATASET_VERSION: &str = "dataset_version";
    pub const DATASET_PATH: &str = "dataset_path";
    pub const DIRS_FROM_PATH: &str = "dirs_from_path";
    pub const NAME: &str = "name";
    pub const SHORT_NAME: &str = "short_name";
    pub const DESCRIPTION: &str = "description";
    pub const URL: &str = "url";
    pub const AUTHORS: &str = "authors";
    pub const PUBLICATIONS: &str = "publications";
    pub const SUBDATASETS: &str = "subdatasets";
    pub const CHILDREN: &str = "children";
    pub const CONTENT_BYTE_SIZE: &str = "contentbytesize";
    pub const PATH: &str = "path";
    pub const EXTRACTOR_NAME: &str = "extractor_name";
    pub const EXTRACTOR_VERSION: &str = "extractor_version";
    pub const EXTRACTED_METADATA: &str = "extracted_metadata";
    pub const DISTRIBUTION: &str = "distribution";
}

/// Kind of entity a metadata record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Dataset,
    Directory,
    File,
}

impl EntityKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dataset" => Some(EntityKind::Dataset),
            "directory" => Some(EntityKind::Directory),
            "file" => Some(EntityKind::File),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Dataset => "dataset",
            EntityKind::Directory => "directory",
            EntityKind::File => "file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one dataset version: the unit a catalog node is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetRef {
    pub dataset_id: String,
    pub dataset_version: String,
}

impl DatasetRef {
    pub fn new(dataset_id: impl Into<String>, dataset_version: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            dataset_version: dataset_version.into(),
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.dataset_id, self.dataset_version)
    }
}
