//! Translator registry.
//!
//! An immutable map from extractor identity to translator, built once and handed
//! to the catalog builder. Adding an extractor family means registering another
//! entry; dispatch itself never changes.

use super::documents;
use super::mapper::{MappingDocument, SchemaMapper};
use super::{BidsDatasetTranslator, Translator, TranslatorIdentity, VersionMatch};
use crate::error::{ApiError, RecordError};
use crate::record::RawRecord;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Identity → translator lookup.
pub struct TranslatorRegistry {
    schema_version: String,
    translators: BTreeMap<TranslatorIdentity, Arc<dyn Translator>>,
}

impl TranslatorRegistry {
    pub fn builder(schema_version: impl Into<String>) -> TranslatorRegistryBuilder {
        TranslatorRegistryBuilder::new(schema_version)
    }

    /// Registry with the embedded mapping documents and the BIDS translator.
    pub fn builtin(schema_version: impl Into<String>) -> Result<Self, ApiError> {
        Self::builder(schema_version).with_builtins()?.build()
    }

    /// Schema version records are resolved against.
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Look up the translator for an extractor identity.
    ///
    /// Name and schema version must match exactly. An entry registered for the exact
    /// extractor version wins over one registered for any version.
    pub fn resolve(
        &self,
        extractor_name: &str,
        extractor_version: Option<&str>,
        schema_version: &str,
    ) -> Option<Arc<dyn Translator>> {
        let exact = extractor_version.and_then(|version| {
            self.translators.get(&TranslatorIdentity::new(
                extractor_name,
                VersionMatch::Exact(version.to_string()),
                schema_version,
            ))
        });
        exact
            .or_else(|| {
                self.translators.get(&TranslatorIdentity::new(
                    extractor_name,
                    VersionMatch::Any,
                    schema_version,
                ))
            })
            .cloned()
    }

    /// Resolve the translator for a record at the registry's schema version.
    pub fn resolve_record(&self, raw: &RawRecord) -> Result<Arc<dyn Translator>, RecordError> {
        let Some(name) = raw.extractor_name.as_deref() else {
            return Err(RecordError::UnrecognizedTranslator {
                identity: "metadata without extractor_name".to_string(),
            });
        };
        let version = raw.extractor_version.as_deref();
        let describe = || {
            format!(
                "{} {} (schema {}) for {} records",
                name,
                version.unwrap_or("<no version>"),
                self.schema_version,
                raw.kind
            )
        };
        match self.resolve(name, version, &self.schema_version) {
            Some(translator) if translator.supports(raw.kind) => Ok(translator),
            _ => Err(RecordError::UnrecognizedTranslator {
                identity: describe(),
            }),
        }
    }

    pub fn identities(&self) -> impl Iterator<Item = &TranslatorIdentity> {
        self.translators.keys()
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

/// Collects mapping documents and custom translators into a [`TranslatorRegistry`].
///
/// Documents sharing an identity become one [`SchemaMapper`]. A later document for
/// the same identity and record kind replaces the earlier one, and a later
/// translator for the same identity replaces the earlier translator.
pub struct TranslatorRegistryBuilder {
    schema_version: String,
    documents: Vec<MappingDocument>,
    translators: Vec<Arc<dyn Translator>>,
}

impl TranslatorRegistryBuilder {
    pub fn new(schema_version: impl Into<String>) -> Self {
        Self {
            schema_version: schema_version.into(),
            documents: Vec::new(),
            translators: Vec::new(),
        }
    }

    pub fn with_builtins(mut self) -> Result<Self, ApiError> {
        self.documents.extend(documents::builtin_documents()?);
        self.translators.push(Arc::new(BidsDatasetTranslator::new()));
        Ok(self)
    }

    pub fn document(mut self, document: MappingDocument) -> Self {
        self.documents.push(document);
        self
    }

    pub fn documents_from_dir(mut self, dir: &Path) -> Result<Self, ApiError> {
        self.documents.extend(documents::load_documents_dir(dir)?);
        Ok(self)
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translators.push(translator);
        self
    }

    pub fn build(self) -> Result<TranslatorRegistry, ApiError> {
        let mut mappers: BTreeMap<TranslatorIdentity, SchemaMapper> = BTreeMap::new();
        for document in self.documents {
            let identity = document.identity(&self.schema_version);
            let mapper = mappers
                .remove(&identity)
                .unwrap_or_else(|| SchemaMapper::new(identity.clone()));
            mappers.insert(identity, mapper.with_document(document, &self.schema_version)?);
        }

        let mut translators: BTreeMap<TranslatorIdentity, Arc<dyn Translator>> = mappers
            .into_iter()
            .map(|(identity, mapper)| (identity, Arc::new(mapper) as Arc<dyn Translator>))
            .collect();
        for translator in self.translators {
            let identity = translator.identity().clone();
            if translators.insert(identity.clone(), translator).is_some() {
                tracing::debug!(identity = %identity, "Translator replaced an earlier registration");
            }
        }

        tracing::debug!(
            count = translators.len(),
            schema_version = %self.schema_version,
            "Translator registry built"
        );
        Ok(TranslatorRegistry {
            schema_version: self.schema_version,
            translators,
        })
    }
}
