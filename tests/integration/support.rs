use metacat::catalog::CatalogBuilder;
use metacat::config::CatalogConfig;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub fn open_catalog(root: &Path) -> CatalogBuilder {
    CatalogBuilder::open(root, &CatalogConfig::default()).unwrap()
}

pub fn metadata_dir(root: &Path) -> PathBuf {
    root.join("metadata")
}

pub fn dataset_record(id: &str, version: &str, extractor: &str) -> Value {
    json!({
        "type": "dataset",
        "dataset_id": id,
        "dataset_version": version,
        "extractor_name": extractor,
    })
}

pub fn file_record(id: &str, version: &str, path: &str, size: i64) -> Value {
    json!({
        "type": "file",
        "dataset_id": id,
        "dataset_version": version,
        "extractor_name": "metalad_core",
        "extractor_version": "1",
        "path": path,
        "extracted_metadata": {
            "contentbytesize": size,
            "distribution": {"url": format!("https://example.org/{}", path)}
        }
    })
}

pub fn write_jsonl(path: &Path, records: &[Value]) {
    let lines: Vec<String> = records.iter().map(|r| r.to_string()).collect();
    std::fs::write(path, lines.join("\n")).unwrap();
}
