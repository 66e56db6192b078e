use metacat::catalog::{IngestOptions, Status};
use metacat::error::IngestError;
use metacat::store::{compute_key, BlobRole, KeyDigest};
use metacat::tree::CatalogNode;
use metacat::types::DatasetRef;
use serde_json::{json, Value};
use tempfile::TempDir;

use super::support::{dataset_record, file_record, metadata_dir, open_catalog};

fn read_blob(root: &std::path::Path, key: &str) -> Value {
    let bytes = std::fs::read(metadata_dir(root).join(format!("{}.json", key))).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn single_dataset_record_creates_main_blob() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    let report = builder
        .ingest_values(
            vec![dataset_record("d1", "v1", "metalad_core_dataset")],
            IngestOptions::default(),
        )
        .unwrap();

    assert_eq!(report.statuses.len(), 1);
    assert_eq!(report.statuses[0].status, Status::Ok);

    let main_key = compute_key(KeyDigest::Md5, "d1", "v1", BlobRole::Main);
    let children_key = compute_key(KeyDigest::Md5, "d1", "v1", BlobRole::Children);
    assert_eq!(report.main_key, main_key);

    let main = read_blob(temp.path(), main_key.as_str());
    assert_eq!(main["dataset_id"], json!("d1"));
    assert_eq!(main["dataset_version"], json!("v1"));
    assert_eq!(main["children"], json!(children_key.as_str()));
    assert_eq!(read_blob(temp.path(), children_key.as_str()), json!({"children": []}));
}

#[test]
fn two_files_share_one_directory() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    builder
        .ingest_values(
            vec![
                file_record("d1", "v1", "x/y.txt", 10),
                file_record("d1", "v1", "x/z.txt", 20),
            ],
            IngestOptions::default(),
        )
        .unwrap();

    let node = builder
        .load_dataset(&DatasetRef::new("d1", "v1"))
        .unwrap()
        .unwrap();
    assert_eq!(node.children.len(), 1);
    let CatalogNode::Directory(x) = &node.children[0] else {
        panic!("expected directory x, got {:?}", node.children[0]);
    };
    assert_eq!(x.name, "x");
    let names: Vec<&str> = x.children.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["y.txt", "z.txt"]);
    assert!(x.children.iter().all(|c| matches!(c, CatalogNode::File(_))));
}

#[test]
fn unrecognized_extractor_still_creates_defaulted_node() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    let report = builder
        .ingest_values(
            vec![dataset_record("d1", "v1", "some_future_extractor")],
            IngestOptions::default(),
        )
        .unwrap();

    assert_eq!(report.statuses[0].status, Status::Skipped);
    assert!(report.statuses[0].message.contains("some_future_extractor"));

    let main = read_blob(temp.path(), report.main_key.as_str());
    for key in ["name", "short_name", "description", "authors", "keywords", "subdatasets"] {
        assert!(main.get(key).is_some(), "missing default {}", key);
    }
    assert_eq!(main["authors"], json!([]));
}

#[test]
fn later_batches_extend_the_tree_and_keep_fields() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    let mut dataset = dataset_record("d1", "v1", "metalad_core_dataset");
    dataset["extracted_metadata"] = json!({"name": "Study", "keywords": ["eeg"]});
    builder
        .ingest_values(
            vec![dataset, file_record("d1", "v1", "a/one.txt", 1)],
            IngestOptions::default(),
        )
        .unwrap();
    builder
        .ingest_values(
            vec![file_record("d1", "v1", "a/two.txt", 2)],
            IngestOptions::default(),
        )
        .unwrap();

    let node = builder
        .load_dataset(&DatasetRef::new("d1", "v1"))
        .unwrap()
        .unwrap();
    assert_eq!(node.str_field("name"), Some("Study"));
    assert_eq!(node.field("keywords"), Some(&json!(["eeg"])));
    let names: Vec<&str> = node.children[0].children().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["one.txt", "two.txt"]);
}

#[test]
fn file_attributes_are_updated_in_place() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    builder
        .ingest_values(
            vec![
                file_record("d1", "v1", "a.txt", 1),
                file_record("d1", "v1", "b.txt", 2),
            ],
            IngestOptions::default(),
        )
        .unwrap();
    let report = builder
        .ingest_values(vec![file_record("d1", "v1", "a.txt", 100)], IngestOptions::default())
        .unwrap();
    assert!(report.statuses[0].message.contains("updated"));

    let node = builder
        .load_dataset(&DatasetRef::new("d1", "v1"))
        .unwrap()
        .unwrap();
    assert_eq!(
        serde_json::to_value(&node.children).unwrap(),
        json!([
            {"type": "file", "name": "a.txt", "contentbytesize": 100, "url": "https://example.org/a.txt"},
            {"type": "file", "name": "b.txt", "contentbytesize": 2, "url": "https://example.org/b.txt"}
        ])
    );
}

#[test]
fn conflicting_datasets_abort_before_any_write() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    let err = builder
        .ingest_values(
            vec![
                dataset_record("d1", "v1", "metalad_core_dataset"),
                file_record("d1", "v1", "a.txt", 1),
                dataset_record("d1", "v2", "metalad_core_dataset"),
            ],
            IngestOptions::default(),
        )
        .unwrap_err();

    match err {
        IngestError::MultipleSourceDatasets { found } => {
            assert_eq!(found, vec![DatasetRef::new("d1", "v1"), DatasetRef::new("d1", "v2")]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!metadata_dir(temp.path()).exists());
}

#[test]
fn every_item_gets_exactly_one_status() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    let report = builder
        .ingest_values(
            vec![
                dataset_record("d1", "v1", "metalad_core_dataset"),
                json!({"type": "file", "dataset_id": "d1", "dataset_version": "v1"}),
                json!({"type": "spreadsheet"}),
                file_record("d1", "v1", "./", 1),
                file_record("d1", "v1", "ok.txt", 1),
                json!(42),
            ],
            IngestOptions::default(),
        )
        .unwrap();

    let statuses: Vec<(usize, Status)> =
        report.statuses.iter().map(|s| (s.index, s.status)).collect();
    assert_eq!(
        statuses,
        vec![
            (0, Status::Ok),
            (1, Status::Error),
            (2, Status::Error),
            (3, Status::Error),
            (4, Status::Ok),
            (5, Status::Impossible),
        ]
    );
    assert!(report.statuses[3].message.contains("no usable segments"));
}

#[test]
fn studyminimeta_resolves_people_and_reports_missing_ones() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    let record = json!({
        "type": "dataset",
        "dataset_id": "d1",
        "dataset_version": "v1",
        "extractor_name": "metalad_studyminimeta",
        "extracted_metadata": {"@graph": [
            {"@type": "CreativeWork", "name": "Memory study", "abstract": "Recall <em>tasks</em>", "keywords": ["memory"]},
            {"@type": "Dataset", "url": "https://example.org/ds", "author": [{"@id": "p1"}, {"@id": "ghost"}]},
            {"@id": "#personList", "@list": [{"@id": "p1", "name": "Ada Lovelace"}]},
            {"@id": "#publicationList", "@list": []}
        ]}
    });
    let report = builder
        .ingest_values(vec![record], IngestOptions::default())
        .unwrap();

    assert_eq!(report.statuses[0].status, Status::Ok);
    assert_eq!(report.statuses[0].warnings.len(), 1);
    assert!(report.statuses[0].warnings[0].contains("ghost"));

    let node = builder.load_dataset(&report.dataset).unwrap().unwrap();
    assert_eq!(node.str_field("name"), Some("Memory study"));
    assert_eq!(node.str_field("short_name"), Some("Memory study"));
    assert_eq!(node.str_field("description"), Some("Recall emtasks/em"));
    assert_eq!(node.str_field("url"), Some("https://example.org/ds"));
    assert_eq!(
        node.field("authors"),
        Some(&json!([{"@id": "p1", "name": "Ada Lovelace"}]))
    );
}

#[test]
fn set_super_pointer_names_the_dataset() {
    let temp = TempDir::new().unwrap();
    let builder = open_catalog(temp.path());

    builder
        .ingest_values(
            vec![dataset_record("d1", "v1", "metalad_core_dataset")],
            IngestOptions { set_super: true },
        )
        .unwrap();

    let pointer: Value = serde_json::from_slice(
        &std::fs::read(metadata_dir(temp.path()).join("super.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(pointer, json!({"dataset_id": "d1", "dataset_version": "v1"}));
}
