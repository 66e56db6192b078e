//! The `super.json` pointer naming the catalog's entry dataset.

use crate::error::StorageError;
use crate::store::BlobStore;
use crate::types::{fields, DatasetRef};
use serde_json::{json, Value};

pub const SUPER_POINTER: &str = "super.json";

/// Point the catalog at `dataset`; returns where the pointer was written.
pub fn write_super(store: &dyn BlobStore, dataset: &DatasetRef) -> Result<String, StorageError> {
    let document = json!({
        "dataset_id": dataset.dataset_id,
        "dataset_version": dataset.dataset_version,
    });
    let location = store.write_pointer(SUPER_POINTER, &document)?;
    tracing::info!(dataset = %dataset, location = %location, "Superdataset pointer written");
    Ok(location)
}

pub fn read_super(store: &dyn BlobStore) -> Result<Option<DatasetRef>, StorageError> {
    let Some(document) = store.read_pointer(SUPER_POINTER)? else {
        return Ok(None);
    };
    let text = |key: &str| document.get(key).and_then(Value::as_str);
    match (text(fields::DATASET_ID), text(fields::DATASET_VERSION)) {
        (Some(id), Some(version)) => Ok(Some(DatasetRef::new(id, version))),
        _ => Err(StorageError::Corrupt {
            key: SUPER_POINTER.to_string(),
            reason: "missing dataset_id or dataset_version".to_string(),
        }),
    }
}
