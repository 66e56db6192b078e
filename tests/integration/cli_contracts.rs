use metacat::error::{ApiError, IngestError};
use metacat::tooling::{CliContext, Commands};
use serde_json::{json, Value};
use tempfile::TempDir;

use super::support::{dataset_record, file_record, write_jsonl};

fn add(metadata: &std::path::Path, format: &str) -> Commands {
    Commands::Add {
        metadata: metadata.to_string_lossy().into_owned(),
        set_super: false,
        format: format.to_string(),
    }
}

#[test]
fn add_reports_every_line_as_json() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("batch.jsonl");
    let mut lines = vec![
        dataset_record("d1", "v1", "metalad_core_dataset").to_string(),
        file_record("d1", "v1", "x/y.txt", 7).to_string(),
    ];
    lines.push("{ broken".to_string());
    std::fs::write(&input, lines.join("\n")).unwrap();

    let ctx = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    let output = ctx.execute(&add(&input, "json")).unwrap();
    let report: Value = serde_json::from_str(&output).unwrap();

    let statuses: Vec<&str> = report["statuses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["ok", "ok", "impossible"]);
    assert_eq!(report["dataset"], json!({"dataset_id": "d1", "dataset_version": "v1"}));
    assert_eq!(report["node_count"], json!(2));
}

#[test]
fn add_text_output_lists_items() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("batch.jsonl");
    write_jsonl(&input, &[file_record("d1", "v1", "notes.md", 3)]);

    let ctx = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    let output = ctx.execute(&add(&input, "text")).unwrap();
    assert!(output.contains("Ingestion"));
    assert!(output.contains("notes.md"));
}

#[test]
fn key_prints_main_and_children_keys() {
    let temp = TempDir::new().unwrap();
    let ctx = CliContext::new(temp.path().to_path_buf(), None).unwrap();

    let main = ctx
        .execute(&Commands::Key {
            dataset_id: "d1".to_string(),
            dataset_version: "v1".to_string(),
            children: false,
        })
        .unwrap();
    let children = ctx
        .execute(&Commands::Key {
            dataset_id: "d1".to_string(),
            dataset_version: "v1".to_string(),
            children: true,
        })
        .unwrap();

    assert_eq!(main.len(), 32);
    assert_eq!(children.len(), 32);
    assert_ne!(main, children);
    assert!(main.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn show_json_inlines_the_tree() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("batch.jsonl");
    write_jsonl(
        &input,
        &[
            dataset_record("d1", "v1", "metalad_core_dataset"),
            file_record("d1", "v1", "x/y.txt", 7),
        ],
    );
    let ctx = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    ctx.execute(&add(&input, "text")).unwrap();

    let output = ctx
        .execute(&Commands::Show {
            dataset_id: "d1".to_string(),
            dataset_version: "v1".to_string(),
            format: "json".to_string(),
        })
        .unwrap();
    let document: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(document["dataset_id"], json!("d1"));
    assert_eq!(document["children"][0]["type"], json!("directory"));
    assert_eq!(document["children"][0]["children"][0]["name"], json!("y.txt"));
}

#[test]
fn show_unknown_dataset_is_an_invalid_argument() {
    let temp = TempDir::new().unwrap();
    let ctx = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    let err = ctx
        .execute(&Commands::Show {
            dataset_id: "nope".to_string(),
            dataset_version: "v0".to_string(),
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
}

#[test]
fn set_super_writes_pointer_file() {
    let temp = TempDir::new().unwrap();
    let ctx = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    let output = ctx
        .execute(&Commands::SetSuper {
            dataset_id: "d1".to_string(),
            dataset_version: "v1".to_string(),
        })
        .unwrap();
    assert!(output.contains("super.json"));

    let pointer: Value = serde_json::from_slice(
        &std::fs::read(ctx.catalog_root().join("metadata").join("super.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(pointer, json!({"dataset_id": "d1", "dataset_version": "v1"}));
}

#[test]
fn fatal_batch_error_surfaces_as_ingest_error() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("batch.jsonl");
    write_jsonl(
        &input,
        &[
            dataset_record("d1", "v1", "metalad_core_dataset"),
            dataset_record("d2", "v1", "metalad_core_dataset"),
        ],
    );
    let ctx = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    let command = add(&input, "json");
    let err = ctx.execute(&command).unwrap_err();
    assert!(matches!(
        err,
        ApiError::Ingest(IngestError::MultipleSourceDatasets { .. })
    ));

    let rendered: Value =
        serde_json::from_str(&metacat::tooling::cli::render_error(&command, &err)).unwrap();
    assert_eq!(rendered["status"], json!("error"));
}

#[test]
fn batch_without_any_dataset_reference_is_rejected() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("batch.jsonl");
    std::fs::write(&input, "{\"type\": \"directory\", \"path\": \"x\"}\n").unwrap();
    let ctx = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    let err = ctx.execute(&add(&input, "json")).unwrap_err();
    assert!(matches!(err, ApiError::Ingest(IngestError::NoSourceDataset)));
    assert!(!ctx.catalog_root().join("metadata").exists());
}
