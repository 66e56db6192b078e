use metacat::catalog::IngestOptions;
use metacat::types::DatasetRef;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

use super::support::{dataset_record, file_record, open_catalog};

const PER_WRITER: usize = 8;

fn leaf_names(builder: &metacat::catalog::CatalogBuilder) -> BTreeSet<String> {
    let node = builder
        .load_dataset(&DatasetRef::new("d1", "v1"))
        .unwrap()
        .unwrap();
    node.children.iter().map(|c| c.name().to_string()).collect()
}

#[test]
fn one_builder_shared_across_threads_loses_no_files() {
    let temp = TempDir::new().unwrap();
    let builder = Arc::new(open_catalog(temp.path()));

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let builder = Arc::clone(&builder);
            thread::spawn(move || {
                for i in 0..PER_WRITER {
                    let path = format!("w{}-{}.txt", writer, i);
                    builder
                        .ingest_values(vec![file_record("d1", "v1", &path, 1)], IngestOptions::default())
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(leaf_names(&builder).len(), 4 * PER_WRITER);
}

#[test]
fn separate_builders_coordinate_through_lock_files() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    let handles: Vec<_> = (0..2)
        .map(|writer| {
            let root = root.clone();
            thread::spawn(move || {
                // Each thread opens its own builder, so only the file lock is shared.
                let builder = open_catalog(&root);
                for i in 0..PER_WRITER {
                    let path = format!("b{}-{}.txt", writer, i);
                    builder
                        .ingest_values(vec![file_record("d1", "v1", &path, 1)], IngestOptions::default())
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let names = leaf_names(&open_catalog(&root));
    assert_eq!(names.len(), 2 * PER_WRITER);
    assert!(names.contains("b0-0.txt"));
    assert!(names.contains("b1-7.txt"));
    assert!(root.join("metadata").join("locks").is_dir());
}

#[test]
fn concurrent_super_pointer_writes_never_fail_a_batch() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let root = root.clone();
            thread::spawn(move || {
                let builder = open_catalog(&root);
                for i in 0..25 {
                    builder
                        .ingest_values(
                            vec![dataset_record(
                                &format!("d{}", writer),
                                &format!("v{}", i),
                                "metalad_core_dataset",
                            )],
                            IngestOptions { set_super: true },
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let pointer: serde_json::Value = serde_json::from_slice(
        &std::fs::read(root.join("metadata").join("super.json")).unwrap(),
    )
    .unwrap();
    assert!(pointer["dataset_id"].as_str().unwrap().starts_with('d'));
    let leftovers = std::fs::read_dir(root.join("metadata"))
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().contains(".tmp-"))
        .count();
    assert_eq!(leftovers, 0);
}
