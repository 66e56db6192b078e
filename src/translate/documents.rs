//! Mapping documents: the embedded set and loading from a directory.

use super::mapper::MappingDocument;
use crate::error::ApiError;
use std::path::Path;
use walkdir::WalkDir;

/// Mapping documents shipped with the crate, `(file name, contents)`.
pub const BUILTIN_DOCUMENTS: &[(&str, &str)] = &[
    (
        "metalad_core_dataset.json",
        include_str!("../../templates/metalad_core_dataset.json"),
    ),
    (
        "metalad_core_for_dataset.json",
        include_str!("../../templates/metalad_core_for_dataset.json"),
    ),
    (
        "metalad_core_for_file.json",
        include_str!("../../templates/metalad_core_for_file.json"),
    ),
    (
        "metalad_studyminimeta.json",
        include_str!("../../templates/metalad_studyminimeta.json"),
    ),
];

/// Parse one document; `.yaml`/`.yml` names are read as YAML, everything else as JSON.
pub fn parse_document(name: &str, text: &str) -> Result<MappingDocument, ApiError> {
    let parsed = if name.ends_with(".yaml") || name.ends_with(".yml") {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(text).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| ApiError::ConfigError(format!("Invalid mapping document {}: {}", name, e)))
}

pub fn builtin_documents() -> Result<Vec<MappingDocument>, ApiError> {
    BUILTIN_DOCUMENTS
        .iter()
        .map(|(name, text)| parse_document(name, text))
        .collect()
}

/// Load every `*.json`, `*.yaml` and `*.yml` document below `dir`, in file name order.
pub fn load_documents_dir(dir: &Path) -> Result<Vec<MappingDocument>, ApiError> {
    if !dir.is_dir() {
        return Err(ApiError::ConfigError(format!(
            "Translators directory not found: {}",
            dir.display()
        )));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to read translators directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = path.to_string_lossy();
        if !(name.ends_with(".json") || name.ends_with(".yaml") || name.ends_with(".yml")) {
            continue;
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to read mapping document {}: {}",
                path.display(),
                e
            ))
        })?;
        documents.push(parse_document(&name, &text)?);
        tracing::debug!(path = %path.display(), "Loaded mapping document");
    }
    Ok(documents)
}
