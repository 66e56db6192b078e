//! Content-Addressed Blob Store
//!
//! Catalog nodes persist as one JSON document per [`BlobKey`]. Keys are derived
//! from the dataset identity, never from the document bytes, so a dataset keeps its
//! key across updates and the browser UI can compute it independently.

pub mod memory;
pub mod persistence;

pub use memory::MemoryBlobStore;
pub use persistence::FsBlobStore;

use crate::error::StorageError;
use crate::types::DatasetRef;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which document of a dataset a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobRole {
    /// The dataset node with its `children` replaced by the children key.
    Main,
    /// `{"children": [...]}` for the dataset's tree.
    Children,
}

/// Digest used to derive blob keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDigest {
    /// Matches the file names the browser UI derives.
    #[default]
    Md5,
    Blake3,
}

/// Lowercase hex digest naming one blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobKey(String);

impl BlobKey {
    /// Accept a key read back from a stored document.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = !hex.is_empty()
            && hex.len() % 2 == 0
            && hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| BlobKey(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash `id-version` (main) or `id-version-children` (children) into a key.
pub fn compute_key(digest: KeyDigest, dataset_id: &str, dataset_version: &str, role: BlobRole) -> BlobKey {
    let mut input = format!("{}-{}", dataset_id, dataset_version);
    if role == BlobRole::Children {
        input.push_str("-children");
    }
    let hex = match digest {
        KeyDigest::Md5 => hex::encode(Md5::digest(input.as_bytes())),
        KeyDigest::Blake3 => hex::encode(blake3::hash(input.as_bytes()).as_bytes()),
    };
    BlobKey(hex)
}

/// Main and children keys of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetKeys {
    pub main: BlobKey,
    pub children: BlobKey,
}

impl DatasetKeys {
    pub fn for_dataset(digest: KeyDigest, dataset: &DatasetRef) -> Self {
        Self {
            main: compute_key(digest, &dataset.dataset_id, &dataset.dataset_version, BlobRole::Main),
            children: compute_key(
                digest,
                &dataset.dataset_id,
                &dataset.dataset_version,
                BlobRole::Children,
            ),
        }
    }
}

/// Key → JSON document map. Implementations never interpret document contents.
pub trait BlobStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn load(&self, key: &BlobKey) -> Result<Option<Value>, StorageError>;

    /// Replace the whole document under `key`.
    fn store(&self, key: &BlobKey, document: &Value) -> Result<(), StorageError>;

    fn exists(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Human-readable location of the blob (a path for file-backed stores).
    fn location(&self, key: &BlobKey) -> String;

    /// Store an auxiliary document such as `super.json` under a fixed name;
    /// returns its location.
    fn write_pointer(&self, name: &str, document: &Value) -> Result<String, StorageError>;

    fn read_pointer(&self, name: &str) -> Result<Option<Value>, StorageError>;
}
