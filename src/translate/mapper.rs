//! Declarative field-copy translation.
//!
//! A mapping table names, for every canonical field, where its value comes from:
//! a flat source key, a nested key path, or a literal default. Present source
//! values are copied; absent ones are omitted.

use super::passes::{self, SecondaryPass};
use super::{Translation, Translator, TranslatorIdentity, VersionMatch};
use crate::error::{ApiError, TranslationError};
use crate::record::{CanonicalRecord, RawRecord};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// Where a canonical field's value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSource {
    /// Top-level key of the source object.
    Key(String),
    /// Key path descending through nested objects, outermost first.
    Path(Vec<String>),
    /// Copied verbatim, regardless of the source.
    Literal { literal: Value },
}

impl FieldSource {
    pub fn resolve<'a>(&'a self, source: &'a Map<String, Value>) -> Option<&'a Value> {
        match self {
            FieldSource::Key(key) => source.get(key),
            FieldSource::Path(path) => lookup_path(source, path),
            FieldSource::Literal { literal } => Some(literal),
        }
    }
}

pub(crate) fn lookup_path<'a, S: AsRef<str>>(
    source: &'a Map<String, Value>,
    path: &[S],
) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = source.get(first.as_ref())?;
    for key in rest {
        current = current.as_object()?.get(key.as_ref())?;
    }
    Some(current)
}

/// `{canonical_field: source}`; iteration order is the canonical field name.
pub type MappingTable = BTreeMap<String, FieldSource>;

/// What the paths of a mapping table are resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceScope {
    /// The raw record object.
    #[default]
    Record,
    /// `{study, dataset, publicationList, personList}` lifted out of the record's `@graph`.
    StudyGraph,
}

/// One declarative mapping document: the table for one record kind of one extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    pub extractor_name: String,
    /// `None` registers the table for every version of the extractor.
    #[serde(default)]
    pub extractor_version: Option<String>,
    /// `None` means the catalog's current schema version.
    #[serde(default)]
    pub schema_version: Option<String>,
    pub kind: EntityKind,
    #[serde(default)]
    pub source: SourceScope,
    pub fields: MappingTable,
    #[serde(default)]
    pub passes: Vec<SecondaryPass>,
}

impl MappingDocument {
    pub fn identity(&self, current_schema_version: &str) -> TranslatorIdentity {
        TranslatorIdentity::new(
            self.extractor_name.clone(),
            VersionMatch::from_option(self.extractor_version.clone()),
            self.schema_version
                .clone()
                .unwrap_or_else(|| current_schema_version.to_string()),
        )
    }
}

#[derive(Debug, Clone)]
struct KindMapping {
    source: SourceScope,
    fields: MappingTable,
    passes: Vec<SecondaryPass>,
}

/// Translator driven entirely by mapping documents.
#[derive(Debug, Clone)]
pub struct SchemaMapper {
    identity: TranslatorIdentity,
    tables: HashMap<EntityKind, KindMapping>,
}

impl SchemaMapper {
    pub fn new(identity: TranslatorIdentity) -> Self {
        Self {
            identity,
            tables: HashMap::new(),
        }
    }

    /// Add the table for one record kind; a later table for the same kind replaces the earlier one.
    pub fn with_document(
        mut self,
        document: MappingDocument,
        current_schema_version: &str,
    ) -> Result<Self, ApiError> {
        let identity = document.identity(current_schema_version);
        if identity != self.identity {
            return Err(ApiError::ConfigError(format!(
                "Mapping document for {} cannot be added to translator {}",
                identity, self.identity
            )));
        }
        if document.kind == EntityKind::Directory {
            return Err(ApiError::ConfigError(format!(
                "Mapping document for {}: directory records are not translated",
                identity
            )));
        }
        self.tables.insert(
            document.kind,
            KindMapping {
                source: document.source,
                fields: document.fields,
                passes: document.passes,
            },
        );
        Ok(self)
    }
}

/// Copy every resolvable source value into `dest`.
pub fn apply_table(table: &MappingTable, source: &Map<String, Value>, dest: &mut Map<String, Value>) {
    for (field, field_source) in table {
        if let Some(value) = field_source.resolve(source) {
            dest.insert(field.clone(), value.clone());
        }
    }
}

impl Translator for SchemaMapper {
    fn identity(&self) -> &TranslatorIdentity {
        &self.identity
    }

    fn supports(&self, kind: EntityKind) -> bool {
        self.tables.contains_key(&kind)
    }

    fn translate(&self, raw: &RawRecord) -> Result<Translation, TranslationError> {
        let mapping = self
            .tables
            .get(&raw.kind)
            .ok_or_else(|| TranslationError::MissingSource {
                field: format!("mapping table for {} records", raw.kind),
            })?;
        let mut record =
            CanonicalRecord::from_envelope(raw).ok_or_else(|| TranslationError::MissingSource {
                field: "dataset_id/dataset_version".to_string(),
            })?;
        let mut issues = Vec::new();

        let source: Cow<'_, Map<String, Value>> = match mapping.source {
            SourceScope::Record => Cow::Borrowed(&raw.body),
            SourceScope::StudyGraph => Cow::Owned(passes::study_context(raw, &mut issues)),
        };

        apply_table(&mapping.fields, &source, &mut record.fields);
        for pass in &mapping.passes {
            pass.apply(raw, &source, &mut record, &mut issues);
        }

        Ok(Translation { record, issues })
    }
}
