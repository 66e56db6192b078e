//! Structural validation seam.
//!
//! Full catalog-schema validation is pluggable through [`RecordValidator`]; the
//! built-in [`EnvelopeValidator`] checks only what the engine itself relies on.

use crate::error::ValidationError;
use crate::types::{fields, EntityKind};
use serde_json::Value;

/// Pure predicate over one incoming metadata object.
pub trait RecordValidator: Send + Sync {
    fn validate(&self, record: &Value) -> Result<(), ValidationError>;
}

/// Checks the envelope fields placement and dispatch depend on.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeValidator;

impl RecordValidator for EnvelopeValidator {
    fn validate(&self, record: &Value) -> Result<(), ValidationError> {
        let obj = record
            .as_object()
            .ok_or_else(|| ValidationError::new("<root>", "must be a JSON object"))?;

        let kind = match obj.get(fields::TYPE) {
            Some(Value::String(s)) => EntityKind::parse(s).ok_or_else(|| {
                ValidationError::new(
                    fields::TYPE,
                    format!("'{}' is not one of dataset, directory, file", s),
                )
            })?,
            Some(_) => return Err(ValidationError::new(fields::TYPE, "must be a string")),
            None => return Err(ValidationError::new(fields::TYPE, "is required")),
        };

        if matches!(kind, EntityKind::Dataset | EntityKind::File) {
            require_non_empty_string(obj.get(fields::DATASET_ID), fields::DATASET_ID)?;
            require_non_empty_string(obj.get(fields::DATASET_VERSION), fields::DATASET_VERSION)?;
        }
        if kind == EntityKind::File {
            require_non_empty_string(obj.get(fields::PATH), fields::PATH)?;
        }

        for key in [fields::EXTRACTOR_NAME, fields::EXTRACTOR_VERSION] {
            if let Some(value) = obj.get(key) {
                if !value.is_string() {
                    return Err(ValidationError::new(key, "must be a string"));
                }
            }
        }
        if let Some(value) = obj.get(fields::EXTRACTED_METADATA) {
            if !value.is_object() {
                return Err(ValidationError::new(
                    fields::EXTRACTED_METADATA,
                    "must be a JSON object",
                ));
            }
        }
        Ok(())
    }
}

fn require_non_empty_string(value: Option<&Value>, field: &str) -> Result<(), ValidationError> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(()),
        Some(Value::String(_)) => Err(ValidationError::new(field, "must not be empty")),
        Some(_) => Err(ValidationError::new(field, "must be a string")),
        None => Err(ValidationError::new(field, "is required")),
    }
}
