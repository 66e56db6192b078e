//! Per-item statuses and the batch report.

use crate::error::RecordError;
use crate::store::BlobKey;
use crate::types::DatasetRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    /// The item was well-formed but could not be applied.
    Error,
    /// The item could not be read as a metadata record at all.
    Impossible,
    /// The item was deliberately not applied (no translator, directory record,
    /// or a file of another dataset).
    Skipped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Error => "error",
            Status::Impossible => "impossible",
            Status::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one input item. Every input item gets exactly one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStatus {
    /// Zero-based position in the batch.
    pub index: usize,
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ItemStatus {
    pub fn new(index: usize, status: Status, message: impl Into<String>) -> Self {
        Self {
            index,
            status,
            message: message.into(),
            path: None,
            warnings: Vec::new(),
        }
    }

    pub fn ok(index: usize, message: impl Into<String>) -> Self {
        Self::new(index, Status::Ok, message)
    }

    pub fn skipped(index: usize, message: impl Into<String>) -> Self {
        Self::new(index, Status::Skipped, message)
    }

    /// Map an item-level error onto its status: unreadable items are
    /// `impossible`, unknown extractors are `skipped`, the rest `error`.
    pub fn from_error(index: usize, err: &RecordError) -> Self {
        let status = match err {
            RecordError::Decode { .. } | RecordError::NotAnObject { .. } => Status::Impossible,
            RecordError::UnrecognizedTranslator { .. } => Status::Skipped,
            RecordError::Validation(_)
            | RecordError::Translation(_)
            | RecordError::InvalidPath { .. } => Status::Error,
        };
        Self::new(index, status, err.to_string())
    }

    pub fn with_path(mut self, path: Option<String>) -> Self {
        self.path = path;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// Result of one successful ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub dataset: DatasetRef,
    pub main_key: BlobKey,
    pub children_key: BlobKey,
    pub main_path: String,
    pub children_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_path: Option<String>,
    pub node_count: usize,
    pub completed_at: DateTime<Utc>,
    pub statuses: Vec<ItemStatus>,
    /// Batch-level notes not tied to one input item.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl IngestReport {
    pub fn count(&self, status: Status) -> usize {
        self.statuses.iter().filter(|s| s.status == status).count()
    }
}
