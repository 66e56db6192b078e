//! Translator for the `bids_dataset` extractor.
//!
//! BIDS output does not fit a field-copy table (authors and funding are plain
//! strings, keywords are the union of two entity lists), so this one implements
//! [`Translator`] directly. Fields without source data are left out.

use super::{Translation, Translator, TranslatorIdentity, VersionMatch};
use crate::error::TranslationError;
use crate::record::{CanonicalRecord, RawRecord};
use crate::types::{fields, EntityKind};
use serde_json::{json, Map, Value};

pub const EXTRACTOR_NAME: &str = "bids_dataset";
pub const EXTRACTOR_VERSION: &str = "0.0.1";
pub const SCHEMA_VERSION: &str = "1.0.0";

const DOI_PREFIX: &str = "DOI:";
const DOI_RESOLVER: &str = "https://www.doi.org/";

pub struct BidsDatasetTranslator {
    identity: TranslatorIdentity,
}

impl BidsDatasetTranslator {
    pub fn new() -> Self {
        Self {
            identity: TranslatorIdentity::new(
                EXTRACTOR_NAME,
                VersionMatch::Exact(EXTRACTOR_VERSION.to_string()),
                SCHEMA_VERSION,
            ),
        }
    }
}

impl Default for BidsDatasetTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(items: Vec<Value>) -> Option<Value> {
    if items.is_empty() {
        None
    } else {
        Some(Value::Array(items))
    }
}

fn array<'a>(meta: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    meta.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn license(meta: &Map<String, Value>) -> Option<Value> {
    let name = match meta.get("license").or_else(|| meta.get("License"))? {
        Value::Object(obj) => obj.get(fields::NAME).cloned().unwrap_or(Value::Null),
        Value::Null => return None,
        other => other.clone(),
    };
    Some(json!({"name": name, "url": ""}))
}

fn authors(meta: &Map<String, Value>) -> Option<Value> {
    non_empty(
        array(meta, "Authors")
            .iter()
            .map(|author| {
                json!({
                    "name": author,
                    "givenName": "",
                    "familyName": "",
                    "email": "",
                    "honorificSuffix": "",
                    "identifiers": []
                })
            })
            .collect(),
    )
}

fn keywords(meta: &Map<String, Value>) -> Option<Value> {
    let nested = |outer: &str, inner: &str| -> Vec<Value> {
        meta.get(outer)
            .and_then(|o| o.get(inner))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    let mut words = nested("entities", "task");
    words.extend(nested("variables", "dataset"));
    non_empty(words)
}

fn funding(meta: &Map<String, Value>) -> Option<Value> {
    non_empty(
        array(meta, "Funding")
            .iter()
            .map(|fund| json!({"name": "", "grant": "", "description": fund}))
            .collect(),
    )
}

fn publications(meta: &Map<String, Value>) -> Option<Value> {
    non_empty(
        array(meta, "references")
            .iter()
            .map(|reference| {
                let doi = reference
                    .get("id")
                    .and_then(Value::as_str)
                    .map(|id| id.replacen(DOI_PREFIX, DOI_RESOLVER, 1))
                    .unwrap_or_default();
                json!({
                    "type": "",
                    "title": reference.get("citation").cloned().unwrap_or(Value::Null),
                    "doi": doi,
                    "datePublished": "",
                    "publicationOutlet": "",
                    "authors": []
                })
            })
            .collect(),
    )
}

fn metadata_sources(raw: &RawRecord) -> Value {
    let field = |key: &str| raw.get(key).cloned().unwrap_or(Value::Null);
    json!({
        "key_source_map": {},
        "sources": [{
            "source_name": field(fields::EXTRACTOR_NAME),
            "source_version": field(fields::EXTRACTOR_VERSION),
            "source_parameter": field("extraction_parameter"),
            "source_time": field("extraction_time"),
            "agent_email": field("agent_email"),
            "agent_name": field("agent_name")
        }]
    })
}

fn entity_count(entities: &Value, key: &str) -> usize {
    entities
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0)
}

impl Translator for BidsDatasetTranslator {
    fn identity(&self) -> &TranslatorIdentity {
        &self.identity
    }

    fn supports(&self, kind: EntityKind) -> bool {
        kind == EntityKind::Dataset
    }

    fn translate(&self, raw: &RawRecord) -> Result<Translation, TranslationError> {
        let meta = raw
            .extracted_metadata()
            .ok_or_else(|| TranslationError::MissingSource {
                field: fields::EXTRACTED_METADATA.to_string(),
            })?;
        let mut record =
            CanonicalRecord::from_envelope(raw).ok_or_else(|| TranslationError::MissingSource {
                field: "dataset_id/dataset_version".to_string(),
            })?;

        let copied = [
            (fields::NAME, meta.get("title").cloned()),
            (fields::DESCRIPTION, meta.get(fields::DESCRIPTION).cloned()),
            ("license", license(meta)),
            (fields::AUTHORS, authors(meta)),
            ("keywords", keywords(meta)),
            ("funding", funding(meta)),
            (fields::PUBLICATIONS, publications(meta)),
            ("metadata_sources", Some(metadata_sources(raw))),
        ];
        for (key, value) in copied {
            if let Some(value) = value.filter(|v| !v.is_null()) {
                record.set(key, value);
            }
        }

        if let Some(entities) = meta.get("entities").filter(|e| e.is_object()) {
            record.set(
                "additional_display",
                json!([{"name": "BIDS", "content": entities}]),
            );
            record.set(
                "top_display",
                json!([
                    {"name": "Subjects", "value": entity_count(entities, "subject")},
                    {"name": "Sessions", "value": entity_count(entities, "session")},
                    {"name": "Tasks", "value": entity_count(entities, "task")},
                    {"name": "Runs", "value": entity_count(entities, "run")}
                ]),
            );
        }

        Ok(Translation::clean(record))
    }
}
