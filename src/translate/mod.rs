//! Translation of extractor output into canonical records.
//!
//! Every extractor family is served by a [`Translator`]. Most are declarative
//! [`SchemaMapper`]s built from mapping documents; families that need real logic
//! (such as [`BidsDatasetTranslator`]) implement the trait directly. The
//! [`TranslatorRegistry`] maps an extractor identity to its translator.

pub mod bids;
pub mod documents;
pub mod mapper;
pub mod passes;
pub mod registry;

pub use bids::BidsDatasetTranslator;
pub use mapper::{FieldSource, MappingDocument, MappingTable, SchemaMapper, SourceScope};
pub use passes::SecondaryPass;
pub use registry::{TranslatorRegistry, TranslatorRegistryBuilder};

use crate::error::TranslationError;
use crate::record::{CanonicalRecord, RawRecord};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which extractor versions a translator accepts.
///
/// Matching is plain string equality; there is no semver interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VersionMatch {
    Exact(String),
    /// Registered explicitly for families that were historically dispatched by name only.
    Any,
}

impl VersionMatch {
    pub fn from_option(version: Option<String>) -> Self {
        match version {
            Some(v) => VersionMatch::Exact(v),
            None => VersionMatch::Any,
        }
    }
}

impl fmt::Display for VersionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionMatch::Exact(v) => f.write_str(v),
            VersionMatch::Any => f.write_str("*"),
        }
    }
}

/// Extractor identity a translator is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TranslatorIdentity {
    pub extractor_name: String,
    pub extractor_version: VersionMatch,
    pub schema_version: String,
}

impl TranslatorIdentity {
    pub fn new(
        extractor_name: impl Into<String>,
        extractor_version: VersionMatch,
        schema_version: impl Into<String>,
    ) -> Self {
        Self {
            extractor_name: extractor_name.into(),
            extractor_version,
            schema_version: schema_version.into(),
        }
    }
}

impl fmt::Display for TranslatorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (schema {})",
            self.extractor_name, self.extractor_version, self.schema_version
        )
    }
}

/// A translated record plus any sub-item problems that were recovered from.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub record: CanonicalRecord,
    pub issues: Vec<TranslationError>,
}

impl Translation {
    pub fn clean(record: CanonicalRecord) -> Self {
        Self {
            record,
            issues: Vec::new(),
        }
    }
}

/// Turns one raw extractor record into a canonical record.
pub trait Translator: Send + Sync {
    fn identity(&self) -> &TranslatorIdentity;

    /// Whether this translator handles records of `kind`.
    fn supports(&self, kind: EntityKind) -> bool;

    fn translate(&self, raw: &RawRecord) -> Result<Translation, TranslationError>;
}
