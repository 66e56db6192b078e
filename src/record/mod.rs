//! Metadata records before and after translation.
//!
//! A [`RawRecord`] is one extractor output item as it arrived on the input stream.
//! A [`CanonicalRecord`] is the same item after a translator normalized it into the
//! catalog's field vocabulary.

pub mod input;
pub mod validation;

use crate::error::ValidationError;
use crate::types::{fields, DatasetRef, EntityKind};
use serde::Serialize;
use serde_json::{Map, Value};

/// One extractor-produced metadata item with its envelope fields lifted out.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub kind: EntityKind,
    /// Present for dataset and file records; directory records may omit it.
    pub dataset: Option<DatasetRef>,
    pub extractor_name: Option<String>,
    pub extractor_version: Option<String>,
    pub path: Option<String>,
    /// The full original object; translators resolve source paths against it.
    pub body: Map<String, Value>,
}

impl RawRecord {
    /// Lift the envelope out of a JSON object.
    ///
    /// Only the `type` field is required here; the stricter per-kind checks live in
    /// [`validation`].
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let body = match value {
            Value::Object(map) => map,
            _ => return Err(ValidationError::new("<root>", "must be a JSON object")),
        };
        let kind = body
            .get(fields::TYPE)
            .and_then(Value::as_str)
            .and_then(EntityKind::parse)
            .ok_or_else(|| {
                ValidationError::new(fields::TYPE, "must be one of dataset, directory, file")
            })?;

        let dataset = match (
            str_field(&body, fields::DATASET_ID),
            str_field(&body, fields::DATASET_VERSION),
        ) {
            (Some(id), Some(version)) => Some(DatasetRef::new(id, version)),
            _ => None,
        };

        Ok(Self {
            kind,
            dataset,
            extractor_name: str_field(&body, fields::EXTRACTOR_NAME),
            extractor_version: str_field(&body, fields::EXTRACTOR_VERSION),
            path: str_field(&body, fields::PATH),
            body,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn extracted_metadata(&self) -> Option<&Map<String, Value>> {
        self.body
            .get(fields::EXTRACTED_METADATA)
            .and_then(Value::as_object)
    }
}

fn str_field(body: &Map<String, Value>, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Translator output: one metadata item in the catalog vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub kind: EntityKind,
    pub dataset: DatasetRef,
    /// Relative, slash-separated placement path for file leaves.
    pub path: Option<String>,
    pub fields: Map<String, Value>,
}

impl CanonicalRecord {
    pub fn new(kind: EntityKind, dataset: DatasetRef) -> Self {
        Self {
            kind,
            dataset,
            path: None,
            fields: Map::new(),
        }
    }

    /// Start a canonical record carrying over the raw envelope (kind, dataset, path).
    pub fn from_envelope(raw: &RawRecord) -> Option<Self> {
        let dataset = raw.dataset.clone()?;
        Some(Self {
            kind: raw.kind,
            dataset,
            path: raw.path.clone(),
            fields: Map::new(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }
}
