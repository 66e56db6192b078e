//! Secondary passes that run after the field copy.
//!
//! Passes are named in mapping documents, so an extractor family opts into them
//! as data. Each pass only touches the canonical fields it owns.

use crate::error::TranslationError;
use crate::record::{CanonicalRecord, RawRecord};
use crate::tree::path_segments;
use crate::types::fields;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const GRAPH: &str = "@graph";
const AT_ID: &str = "@id";
const AT_TYPE: &str = "@type";
const AT_LIST: &str = "@list";
const TYPE_DATASET: &str = "Dataset";
const TYPE_CREATIVE_WORK: &str = "CreativeWork";
const PERSON_LIST: &str = "#personList";
const PUBLICATION_LIST: &str = "#publicationList";
const ORIGIN: &str = "origin";
const HAS_PART: &str = "hasPart";
const DATALAD_PREFIX: &str = "datalad:";

/// Keys of the study context built by [`study_context`].
pub mod study {
    pub const STUDY: &str = "study";
    pub const DATASET: &str = "dataset";
    pub const PUBLICATION_LIST: &str = "publicationList";
    pub const PERSON_LIST: &str = "personList";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryPass {
    /// Copy the `origin` distribution URL of the graph's Dataset entry into `url`.
    OriginUrl,
    /// Expand the graph Dataset entry's `hasPart` list into `subdatasets`.
    Subdatasets,
    /// Inline author and publication references from the study person/publication lists.
    StudyPersonList,
    /// Strip angle brackets from `description`.
    SanitizeDescription,
}

impl SecondaryPass {
    pub fn apply(
        &self,
        raw: &RawRecord,
        source: &Map<String, Value>,
        record: &mut CanonicalRecord,
        issues: &mut Vec<TranslationError>,
    ) {
        match self {
            SecondaryPass::OriginUrl => origin_url(raw, record),
            SecondaryPass::Subdatasets => subdatasets(raw, record, issues),
            SecondaryPass::StudyPersonList => study_person_list(source, record, issues),
            SecondaryPass::SanitizeDescription => sanitize_description(record),
        }
    }
}

fn graph(raw: &RawRecord) -> &[Value] {
    raw.extracted_metadata()
        .and_then(|m| m.get(GRAPH))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn find_by<'a>(items: &'a [Value], key: &str, expected: &str) -> Option<&'a Map<String, Value>> {
    items
        .iter()
        .filter_map(Value::as_object)
        .find(|item| item.get(key).and_then(Value::as_str) == Some(expected))
}

fn graph_dataset(raw: &RawRecord) -> Option<&Map<String, Value>> {
    find_by(graph(raw), AT_TYPE, TYPE_DATASET)
}

fn origin_url(raw: &RawRecord, record: &mut CanonicalRecord) {
    let url = graph_dataset(raw)
        .and_then(|ds| ds.get(fields::DISTRIBUTION))
        .and_then(Value::as_array)
        .and_then(|dists| find_by(dists, fields::NAME, ORIGIN))
        .and_then(|origin| origin.get(fields::URL));
    if let Some(url) = url {
        record.set(fields::URL, url.clone());
    }
}

fn strip_datalad(value: &str) -> &str {
    value.strip_prefix(DATALAD_PREFIX).unwrap_or(value)
}

fn subdatasets(raw: &RawRecord, record: &mut CanonicalRecord, issues: &mut Vec<TranslationError>) {
    let parts = graph_dataset(raw)
        .and_then(|ds| ds.get(HAS_PART))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        let part_str = |key: &str| part.get(key).and_then(Value::as_str);
        let (Some(identifier), Some(version), Some(name)) =
            (part_str("identifier"), part_str(AT_ID), part_str(fields::NAME))
        else {
            issues.push(TranslationError::InvalidShape {
                field: HAS_PART.to_string(),
                expected: "entries with identifier, @id and name strings",
            });
            continue;
        };
        let mut entry = Map::new();
        entry.insert(fields::DATASET_ID.to_string(), strip_datalad(identifier).into());
        entry.insert(fields::DATASET_VERSION.to_string(), strip_datalad(version).into());
        entry.insert(fields::DATASET_PATH.to_string(), name.into());
        entry.insert(
            fields::DIRS_FROM_PATH.to_string(),
            Value::Array(path_segments(name).into_iter().map(Value::String).collect()),
        );
        out.push(Value::Object(entry));
    }
    record.set(fields::SUBDATASETS, Value::Array(out));
}

/// Build the `{study, dataset, publicationList, personList}` context from the record graph.
///
/// Missing graph entries are reported and left out of the context.
pub fn study_context(raw: &RawRecord, issues: &mut Vec<TranslationError>) -> Map<String, Value> {
    let graph = graph(raw);
    let mut context = Map::new();

    match find_by(graph, AT_TYPE, TYPE_CREATIVE_WORK) {
        Some(study) => {
            context.insert(study::STUDY.to_string(), Value::Object(study.clone()));
        }
        None => issues.push(TranslationError::MissingSource {
            field: format!("{} entry with @type {}", GRAPH, TYPE_CREATIVE_WORK),
        }),
    }
    match find_by(graph, AT_TYPE, TYPE_DATASET) {
        Some(dataset) => {
            context.insert(study::DATASET.to_string(), Value::Object(dataset.clone()));
        }
        None => issues.push(TranslationError::MissingSource {
            field: format!("{} entry with @type {}", GRAPH, TYPE_DATASET),
        }),
    }
    for (list_id, key) in [
        (PUBLICATION_LIST, study::PUBLICATION_LIST),
        (PERSON_LIST, study::PERSON_LIST),
    ] {
        match find_by(graph, AT_ID, list_id).and_then(|l| l.get(AT_LIST)) {
            Some(list) => {
                context.insert(key.to_string(), list.clone());
            }
            None => issues.push(TranslationError::MissingSource {
                field: format!("{} entry with @id {}", GRAPH, list_id),
            }),
        }
    }
    context
}

fn resolve_person(
    persons: &[Value],
    reference: &Value,
    issues: &mut Vec<TranslationError>,
) -> Option<Value> {
    let Some(id) = reference.get(AT_ID).and_then(Value::as_str) else {
        issues.push(TranslationError::InvalidShape {
            field: "author".to_string(),
            expected: "object with an @id reference",
        });
        return None;
    };
    match find_by(persons, AT_ID, id) {
        Some(person) => Some(Value::Object(person.clone())),
        None => {
            issues.push(TranslationError::UnresolvedReference {
                list: PERSON_LIST.to_string(),
                id: id.to_string(),
            });
            None
        }
    }
}

fn rename_linked_data_keys(entry: &Map<String, Value>) -> Map<String, Value> {
    entry
        .iter()
        .filter(|(k, _)| k.as_str() != AT_ID)
        .map(|(k, v)| {
            let key = match k.as_str() {
                AT_TYPE => "type",
                "sameAs" => "doi",
                other => other,
            };
            (key.to_string(), v.clone())
        })
        .collect()
}

fn array_field(record: &mut CanonicalRecord, key: &str) -> Vec<Value> {
    match record.fields.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn study_person_list(
    source: &Map<String, Value>,
    record: &mut CanonicalRecord,
    issues: &mut Vec<TranslationError>,
) {
    let persons = source
        .get(study::PERSON_LIST)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut authors = array_field(record, fields::AUTHORS);
    let references = source
        .get(study::DATASET)
        .and_then(|ds| ds.get("author"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    authors.extend(
        references
            .iter()
            .filter_map(|reference| resolve_person(persons, reference, issues)),
    );
    record.set(fields::AUTHORS, Value::Array(authors));

    let mut publications = array_field(record, fields::PUBLICATIONS);
    let entries = source
        .get(study::PUBLICATION_LIST)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    for entry in entries.iter().filter_map(Value::as_object) {
        let mut publication = rename_linked_data_keys(entry);
        if let Some(Value::Object(outlet)) = entry.get("publication") {
            publication.insert(
                "publication".to_string(),
                Value::Object(rename_linked_data_keys(outlet)),
            );
        }
        if let Some(Value::Array(refs)) = entry.get("author") {
            let resolved: Vec<Value> = refs
                .iter()
                .filter_map(|reference| resolve_person(persons, reference, issues))
                .collect();
            publication.insert("author".to_string(), Value::Array(resolved));
        }
        publications.push(Value::Object(publication));
    }
    record.set(fields::PUBLICATIONS, Value::Array(publications));
}

fn sanitize_description(record: &mut CanonicalRecord) {
    if let Some(Value::String(description)) = record.fields.get_mut(fields::DESCRIPTION) {
        description.retain(|c| c != '<' && c != '>');
    }
}
