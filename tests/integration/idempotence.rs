use metacat::catalog::IngestOptions;
use serde_json::{json, Value};
use tempfile::TempDir;

use super::support::{dataset_record, file_record, metadata_dir, open_catalog};

fn batch() -> Vec<Value> {
    let mut dataset = dataset_record("d1", "v1", "metalad_core_dataset");
    dataset["dataset_path"] = json!("studies/d1");
    dataset["extracted_metadata"] = json!({"description": "A dataset"});
    let mut structure = dataset_record("d1", "v1", "metalad_core");
    structure["extracted_metadata"] = json!({"@graph": [
        {"@type": "Dataset", "hasPart": [
            {"identifier": "datalad:s1", "@id": "datalad:w1", "name": "derivatives/s1"}
        ]}
    ]});
    vec![
        dataset,
        structure,
        file_record("d1", "v1", "code/run.sh", 120),
        file_record("d1", "v1", "data/sub-01/anat.nii.gz", 4096),
    ]
}

fn snapshot(root: &std::path::Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = std::fs::read_dir(metadata_dir(root))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .map(|path| {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, std::fs::read(&path).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn reingesting_a_batch_leaves_blobs_byte_identical() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    builder.ingest_values(batch(), IngestOptions::default()).unwrap();
    let first = snapshot(temp.path());
    assert_eq!(first.len(), 2);

    let report = builder.ingest_values(batch(), IngestOptions::default()).unwrap();
    assert_eq!(snapshot(temp.path()), first);
    assert!(report.statuses[2].message.contains("unchanged"));
}

#[test]
fn a_fresh_builder_sees_the_same_catalog() {
    let temp = TempDir::new().unwrap();
    open_catalog(temp.path())
        .ingest_values(batch(), IngestOptions::default())
        .unwrap();
    let first = snapshot(temp.path());

    open_catalog(temp.path())
        .ingest_values(batch(), IngestOptions::default())
        .unwrap();
    assert_eq!(snapshot(temp.path()), first);
}

#[test]
fn subdatasets_and_defaults_are_stable_across_runs() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());
    builder.ingest_values(batch(), IngestOptions::default()).unwrap();
    builder.ingest_values(batch(), IngestOptions::default()).unwrap();

    let node = builder
        .load_dataset(&metacat::types::DatasetRef::new("d1", "v1"))
        .unwrap()
        .unwrap();
    assert_eq!(node.str_field("name"), Some("d1"));
    assert_eq!(node.str_field("short_name"), Some("d1"));

    let top: Vec<&str> = node.children.iter().map(|c| c.name()).collect();
    assert_eq!(top, vec!["derivatives", "code", "data"]);
    let derivatives = node.children[0].children();
    assert_eq!(derivatives.len(), 1);
    assert_eq!(
        serde_json::to_value(&derivatives[0]).unwrap(),
        json!({"type": "dataset", "name": "s1", "dataset_id": "s1", "dataset_version": "w1"})
    );
}
