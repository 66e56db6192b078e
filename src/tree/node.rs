//! Catalog node types.
//!
//! Child nodes serialize to the shapes the browser UI reads:
//! `{"type":"directory","name","children"}`, `{"type":"file","name","contentbytesize","url"}`
//! and `{"type":"dataset","name","dataset_id","dataset_version"}`.

use crate::types::{fields, DatasetRef, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Size recorded for a file whose byte size is unknown.
pub const UNKNOWN_SIZE: i64 = -1;

/// A node below a dataset's root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogNode {
    Directory(DirectoryNode),
    File(FileNode),
    /// Reference to a subdataset; its own tree lives under its own keys.
    Dataset(SubdatasetNode),
}

impl CatalogNode {
    pub fn name(&self) -> &str {
        match self {
            CatalogNode::Directory(dir) => &dir.name,
            CatalogNode::File(file) => &file.name,
            CatalogNode::Dataset(sub) => &sub.name,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            CatalogNode::Directory(_) => EntityKind::Directory,
            CatalogNode::File(_) => EntityKind::File,
            CatalogNode::Dataset(_) => EntityKind::Dataset,
        }
    }

    pub fn children(&self) -> &[CatalogNode] {
        match self {
            CatalogNode::Directory(dir) => &dir.children,
            _ => &[],
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(CatalogNode::count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub name: String,
    #[serde(default)]
    pub children: Vec<CatalogNode>,
}

impl DirectoryNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    #[serde(rename = "contentbytesize", default = "unknown_size")]
    pub content_byte_size: i64,
    #[serde(default)]
    pub url: String,
}

fn unknown_size() -> i64 {
    UNKNOWN_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubdatasetNode {
    pub name: String,
    pub dataset_id: String,
    pub dataset_version: String,
}

/// A dataset's fields plus its owned tree.
///
/// In memory the tree is held directly. On disk it is split into a main document
/// (fields, with `children` naming the children blob) and a children document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetNode {
    pub fields: Map<String, Value>,
    pub children: Vec<CatalogNode>,
}

impl DatasetNode {
    /// Skeleton for a dataset seen for the first time.
    pub fn new(dataset: &DatasetRef) -> Self {
        let mut node = Self::default();
        node.set_identity(dataset);
        node
    }

    /// Force `type`, `dataset_id` and `dataset_version` to the given pair.
    pub fn set_identity(&mut self, dataset: &DatasetRef) {
        self.fields.insert(
            fields::TYPE.to_string(),
            Value::String(EntityKind::Dataset.as_str().to_string()),
        );
        self.fields.insert(
            fields::DATASET_ID.to_string(),
            Value::String(dataset.dataset_id.clone()),
        );
        self.fields.insert(
            fields::DATASET_VERSION.to_string(),
            Value::String(dataset.dataset_version.clone()),
        );
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Subdataset references as stored in the `subdatasets` field.
    pub fn subdatasets(&self) -> Vec<SubdatasetRef> {
        self.fields
            .get(fields::SUBDATASETS)
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(SubdatasetRef::from_value).collect())
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.children.iter().map(CatalogNode::count).sum()
    }
}

/// One entry of a dataset's `subdatasets` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdatasetRef {
    pub dataset: DatasetRef,
    pub dataset_path: String,
    pub dirs_from_path: Vec<String>,
}

impl SubdatasetRef {
    fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let text = |key: &str| entry.get(key).and_then(Value::as_str);
        let dataset = DatasetRef::new(text(fields::DATASET_ID)?, text(fields::DATASET_VERSION)?);
        let dataset_path = text(fields::DATASET_PATH).unwrap_or_default().to_string();
        let dirs_from_path = match entry.get(fields::DIRS_FROM_PATH).and_then(Value::as_array) {
            Some(dirs) => dirs
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => super::path_segments(&dataset_path),
        };
        Some(Self {
            dataset,
            dataset_path,
            dirs_from_path,
        })
    }
}
