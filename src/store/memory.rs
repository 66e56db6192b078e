//! In-memory blob store.
//!
//! Holds serialized bytes rather than parsed values so callers can compare stored
//! documents byte for byte, exactly as they would compare files on disk.

use super::{BlobKey, BlobStore};
use crate::error::StorageError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<BlobKey, Vec<u8>>>,
    pointers: RwLock<HashMap<String, Value>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored bytes under `key`, if any.
    pub fn bytes(&self, key: &BlobKey) -> Option<Vec<u8>> {
        self.blobs.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &BlobKey) -> Result<Option<Value>, StorageError> {
        let blobs = self.blobs.read();
        let Some(bytes) = blobs.get(key) else {
            return Ok(None);
        };
        serde_json::from_slice(bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn store(&self, key: &BlobKey, document: &Value) -> Result<(), StorageError> {
        let bytes =
            serde_json::to_vec(document).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.blobs.write().insert(key.clone(), bytes);
        Ok(())
    }

    fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        Ok(self.blobs.read().contains_key(key))
    }

    fn location(&self, key: &BlobKey) -> String {
        format!("memory:{}", key)
    }

    fn write_pointer(&self, name: &str, document: &Value) -> Result<String, StorageError> {
        self.pointers.write().insert(name.to_string(), document.clone());
        Ok(format!("memory:{}", name))
    }

    fn read_pointer(&self, name: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.pointers.read().get(name).cloned())
    }
}
