//! Error types for catalog ingestion.
//!
//! Errors are split by blast radius: [`TranslationError`] and [`RecordError`] are
//! item-level and end up in the per-item status stream, [`IngestError`] aborts a whole
//! batch before anything is written, and [`ApiError`] is what the config, logging and
//! CLI layers hand back to callers.

use crate::types::DatasetRef;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of the blob store or the lock guarding it.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Blob {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Failed to lock {}: {source}", path.display())]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A record failed the structural check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A translator could not produce part of (or all of) a canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("Reference '{id}' not found in {list}")]
    UnresolvedReference { list: String, id: String },

    #[error("Required source field missing: {field}")]
    MissingSource { field: String },

    #[error("Field {field} has unexpected shape (expected {expected})")]
    InvalidShape {
        field: String,
        expected: &'static str,
    },
}

/// Item-level failure; reported in the status stream, never aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Line {line}: not valid JSON: {message}")]
    Decode { line: usize, message: String },

    #[error("Line {line}: metadata item is not a JSON object")]
    NotAnObject { line: usize },

    #[error("Schema validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("No translator registered for {identity}")]
    UnrecognizedTranslator { identity: String },

    #[error("Translation failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("Path '{path}' has no usable segments")]
    InvalidPath { path: String },
}

/// Batch-level failure; nothing has been written when one of these is returned.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(
        "Dataset-level metadata found for multiple source datasets ({}); all input metadata must come from a single dataset",
        join_refs(.found)
    )]
    MultipleSourceDatasets { found: Vec<DatasetRef> },

    #[error("No source dataset found in input: need at least one dataset-level record or file records of a single dataset")]
    NoSourceDataset,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

fn join_refs(refs: &[DatasetRef]) -> String {
    refs.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced to library callers outside the ingestion core.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
