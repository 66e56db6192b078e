use metacat::catalog::{CatalogBuilder, IngestOptions};
use metacat::config::{CatalogConfig, ConfigLoader};
use metacat::error::StorageError;
use metacat::store::{BlobStore, FsBlobStore, MemoryBlobStore};
use metacat::translate::TranslatorRegistry;
use metacat::types::DatasetRef;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use super::support::{dataset_record, file_record, metadata_dir, open_catalog};

#[test]
fn blake3_digest_from_config_file_gives_long_keys() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("metacat.toml"),
        "[catalog]\nkey_digest = \"blake3\"\nmetadata_dir = \"blobs\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load(temp.path()).unwrap();
    let builder = CatalogBuilder::open(temp.path(), &config).unwrap();
    let report = builder
        .ingest_values(
            vec![dataset_record("d1", "v1", "metalad_core_dataset")],
            IngestOptions::default(),
        )
        .unwrap();

    assert_eq!(report.main_key.as_str().len(), 64);
    assert!(temp
        .path()
        .join("blobs")
        .join(report.main_key.file_name())
        .is_file());
}

#[test]
fn memory_store_backs_the_same_pipeline() {
    let store = Arc::new(MemoryBlobStore::new());
    let registry = TranslatorRegistry::builtin("1.0.0").unwrap();
    let builder = CatalogBuilder::new(registry, store.clone());

    builder
        .ingest_values(
            vec![
                dataset_record("d1", "v1", "metalad_core_dataset"),
                file_record("d1", "v1", "a/b.txt", 3),
            ],
            IngestOptions { set_super: true },
        )
        .unwrap();

    assert_eq!(store.len(), 2);
    let node = builder
        .load_dataset(&DatasetRef::new("d1", "v1"))
        .unwrap()
        .unwrap();
    assert_eq!(node.node_count(), 2);
    assert_eq!(
        store.read_pointer("super.json").unwrap(),
        Some(json!({"dataset_id": "d1", "dataset_version": "v1"}))
    );
}

#[test]
fn corrupt_main_blob_is_reported_not_replaced() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());
    let report = builder
        .ingest_values(
            vec![dataset_record("d1", "v1", "metalad_core_dataset")],
            IngestOptions::default(),
        )
        .unwrap();

    let path = metadata_dir(temp.path()).join(report.main_key.file_name());
    std::fs::write(&path, b"{ not json").unwrap();

    let err = builder
        .ingest_values(
            vec![dataset_record("d1", "v1", "metalad_core_dataset")],
            IngestOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        metacat::error::IngestError::Storage(StorageError::Corrupt { .. })
    ));
    assert_eq!(std::fs::read(&path).unwrap(), b"{ not json");
}

#[test]
fn blobs_from_an_older_inline_layout_still_load() {
    let temp = TempDir::new().unwrap();
    let config = CatalogConfig::default();
    let builder = CatalogBuilder::open(temp.path(), &config).unwrap();
    let dataset = DatasetRef::new("d1", "v1");
    let keys = builder.keys(&dataset);

    let store = FsBlobStore::new(metadata_dir(temp.path()));
    store
        .store(
            &keys.main,
            &json!({
                "dataset_id": "d1",
                "dataset_version": "v1",
                "children": [{"type": "file", "name": "old.txt", "contentbytesize": 5, "url": ""}]
            }),
        )
        .unwrap();

    builder
        .ingest_values(vec![file_record("d1", "v1", "new.txt", 6)], IngestOptions::default())
        .unwrap();
    let node = builder.load_dataset(&dataset).unwrap().unwrap();
    let names: Vec<&str> = node.children.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["old.txt", "new.txt"]);
    assert_eq!(
        store.load(&keys.main).unwrap().unwrap()["children"],
        json!(keys.children.as_str())
    );
}
