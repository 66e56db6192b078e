//! Catalog Builder
//!
//! Turns one batch of metadata items into an updated dataset node:
//! partition the batch, pick the governing dataset, load its node, apply
//! dataset-level translations in batch order, fill defaults, merge subdataset
//! and file leaves into the tree, then persist the main and children blobs.
//!
//! Batch-level problems (several source datasets, no source dataset, storage
//! failures while loading) abort before anything is written. Everything else is
//! reported per item and the batch continues.

pub mod defaults;
pub mod report;
pub mod superdataset;

pub use report::{IngestReport, ItemStatus, Status};
pub use superdataset::{read_super, write_super, SUPER_POINTER};

use crate::concurrency::{CatalogLock, KeyLockManager};
use crate::config::CatalogConfig;
use crate::error::{ApiError, IngestError, RecordError, StorageError};
use crate::record::input::InputItem;
use crate::record::validation::{EnvelopeValidator, RecordValidator};
use crate::record::RawRecord;
use crate::store::{BlobKey, BlobStore, DatasetKeys, FsBlobStore, KeyDigest};
use crate::translate::TranslatorRegistry;
use crate::tree::{merge_leaf, split_leaf_path, CatalogNode, DatasetNode, Leaf, MergeOutcome, UNKNOWN_SIZE};
use crate::types::{fields, DatasetRef, EntityKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Per-call ingestion switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Also point `super.json` at the ingested dataset.
    pub set_super: bool,
}

/// On-disk shape of a children blob.
#[derive(Serialize, Deserialize)]
struct ChildrenDocument {
    #[serde(default)]
    children: Vec<CatalogNode>,
}

/// Builds and updates catalog nodes in a [`BlobStore`].
pub struct CatalogBuilder {
    registry: Arc<TranslatorRegistry>,
    validator: Arc<dyn RecordValidator>,
    store: Arc<dyn BlobStore>,
    digest: KeyDigest,
    locks: Arc<KeyLockManager>,
    lock_dir: Option<PathBuf>,
}

impl CatalogBuilder {
    pub fn new(registry: TranslatorRegistry, store: Arc<dyn BlobStore>) -> Self {
        Self {
            registry: Arc::new(registry),
            validator: Arc::new(EnvelopeValidator),
            store,
            digest: KeyDigest::default(),
            locks: Arc::new(KeyLockManager::new()),
            lock_dir: None,
        }
    }

    /// File-backed builder for the catalog at `root`.
    pub fn open(root: &Path, config: &CatalogConfig) -> Result<Self, ApiError> {
        let metadata_dir = root.join(&config.catalog.metadata_dir);

        let mut registry = TranslatorRegistry::builder(config.catalog.schema_version.as_str())
            .with_builtins()?;
        if let Some(dir) = &config.catalog.translators_dir {
            let dir = if dir.is_absolute() {
                dir.clone()
            } else {
                root.join(dir)
            };
            registry = registry.documents_from_dir(&dir)?;
        }

        let mut builder = Self::new(registry.build()?, Arc::new(FsBlobStore::new(&metadata_dir)))
            .with_digest(config.catalog.key_digest);
        if config.lock.enabled {
            builder = builder.with_lock_dir(metadata_dir.join("locks"));
        }
        info!(
            root = %root.display(),
            metadata_dir = %metadata_dir.display(),
            translators = builder.registry.len(),
            "Catalog opened"
        );
        Ok(builder)
    }

    pub fn with_validator(mut self, validator: Arc<dyn RecordValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_digest(mut self, digest: KeyDigest) -> Self {
        self.digest = digest;
        self
    }

    /// Hold a cross-process lock file in `dir` for the duration of each ingestion.
    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }

    /// Share in-process locks with other builders over the same store.
    pub fn with_lock_manager(mut self, locks: Arc<KeyLockManager>) -> Self {
        self.locks = locks;
        self
    }

    pub fn registry(&self) -> &TranslatorRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    pub fn keys(&self, dataset: &DatasetRef) -> DatasetKeys {
        DatasetKeys::for_dataset(self.digest, dataset)
    }

    /// Ingest already-parsed JSON values, one item each.
    pub fn ingest_values(
        &self,
        values: impl IntoIterator<Item = Value>,
        options: IngestOptions,
    ) -> Result<IngestReport, IngestError> {
        let items = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| InputItem::from_value(i + 1, value))
            .collect();
        self.ingest(items, options)
    }

    /// Apply one batch to its dataset node and persist the result.
    pub fn ingest(&self, items: Vec<InputItem>, options: IngestOptions) -> Result<IngestReport, IngestError> {
        let mut batch = Batch::new(items.len());
        for (index, item) in items.into_iter().enumerate() {
            batch.classify(index, item, self.validator.as_ref());
        }

        let dataset = match governing_dataset(&batch) {
            Ok(dataset) => dataset,
            Err(err) => {
                error!(error = %err, items = batch.statuses.len(), "Batch rejected");
                return Err(err);
            }
        };
        let keys = self.keys(&dataset);

        let key_lock = self.locks.get_lock(&keys.main);
        let _guard = key_lock.lock();
        let _file_lock = match &self.lock_dir {
            Some(dir) => Some(CatalogLock::acquire(dir, &keys.main)?),
            None => None,
        };

        let mut node = match self.load_dataset(&dataset)? {
            Some(node) => node,
            None => {
                debug!(dataset = %dataset, "Creating dataset node");
                DatasetNode::new(&dataset)
            }
        };

        for (index, raw) in std::mem::take(&mut batch.datasets) {
            let status = self.apply_dataset_record(index, &raw, &mut node);
            batch.record(status);
        }
        node.set_identity(&dataset);
        defaults::populate(&mut node);

        let mut warnings = Vec::new();
        merge_subdatasets(&mut node, &mut warnings);

        for (index, raw) in std::mem::take(&mut batch.files) {
            let status = self.apply_file_record(index, &raw, &dataset, &mut node);
            batch.record(status);
        }

        let node_count = node.node_count();
        let children = serde_json::to_value(ChildrenDocument {
            children: std::mem::take(&mut node.children),
        })
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut main = node.fields.clone();
        main.insert(
            fields::CHILDREN.to_string(),
            Value::String(keys.children.to_string()),
        );

        // Children first, so a stored main blob never names a missing children blob.
        self.store.store(&keys.children, &children)?;
        self.store.store(&keys.main, &Value::Object(main))?;

        let super_path = if options.set_super {
            Some(write_super(self.store.as_ref(), &dataset)?)
        } else {
            None
        };

        let report = IngestReport {
            main_path: self.store.location(&keys.main),
            children_path: self.store.location(&keys.children),
            dataset,
            main_key: keys.main,
            children_key: keys.children,
            super_path,
            node_count,
            completed_at: chrono::Utc::now(),
            statuses: batch.finish(),
            warnings,
        };
        info!(
            dataset = %report.dataset,
            ok = report.count(Status::Ok),
            skipped = report.count(Status::Skipped),
            error = report.count(Status::Error),
            impossible = report.count(Status::Impossible),
            nodes = report.node_count,
            "Batch ingested"
        );
        Ok(report)
    }

    /// Read a dataset node back, reassembling its tree from the children blob.
    pub fn load_dataset(&self, dataset: &DatasetRef) -> Result<Option<DatasetNode>, StorageError> {
        let keys = self.keys(dataset);
        let Some(main) = self.store.load(&keys.main)? else {
            return Ok(None);
        };
        let Value::Object(mut fields) = main else {
            return Err(StorageError::Corrupt {
                key: keys.main.to_string(),
                reason: "main blob is not a JSON object".to_string(),
            });
        };

        let children = match fields.remove(fields::CHILDREN) {
            Some(Value::String(hex)) => match BlobKey::from_hex(&hex) {
                Some(key) => self.load_children(&key)?,
                None => {
                    return Err(StorageError::Corrupt {
                        key: keys.main.to_string(),
                        reason: format!("children reference '{}' is not a blob key", hex),
                    })
                }
            },
            // Older catalogs kept the tree inline.
            Some(inline @ Value::Array(_)) => parse_children(&keys.main, inline)?,
            _ => Vec::new(),
        };
        Ok(Some(DatasetNode { fields, children }))
    }

    /// Point `super.json` at `dataset`.
    pub fn set_super(&self, dataset: &DatasetRef) -> Result<String, StorageError> {
        write_super(self.store.as_ref(), dataset)
    }

    fn load_children(&self, key: &BlobKey) -> Result<Vec<CatalogNode>, StorageError> {
        match self.store.load(key)? {
            Some(document) => {
                let parsed: ChildrenDocument =
                    serde_json::from_value(document).map_err(|e| StorageError::Corrupt {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(parsed.children)
            }
            None => Ok(Vec::new()),
        }
    }

    fn apply_dataset_record(&self, index: usize, raw: &RawRecord, node: &mut DatasetNode) -> ItemStatus {
        let translator = match self.registry.resolve_record(raw) {
            Ok(translator) => translator,
            Err(err) => {
                warn!(index, error = %err, "Dataset record skipped");
                return ItemStatus::from_error(index, &err);
            }
        };
        let translation = match translator.translate(raw) {
            Ok(translation) => translation,
            Err(err) => {
                let err = RecordError::from(err);
                warn!(index, error = %err, "Dataset record failed to translate");
                return ItemStatus::from_error(index, &err);
            }
        };

        let mut applied = 0;
        for (key, value) in translation.record.fields {
            // The tree is owned by the builder, never by a translator.
            if key == fields::CHILDREN {
                continue;
            }
            node.fields.insert(key, value);
            applied += 1;
        }
        let warnings = issue_messages(index, &translation.issues);
        debug!(index, translator = %translator.identity(), fields = applied, "Dataset record applied");
        ItemStatus::ok(
            index,
            format!("dataset metadata applied by {}", translator.identity()),
        )
        .with_warnings(warnings)
    }

    fn apply_file_record(
        &self,
        index: usize,
        raw: &RawRecord,
        dataset: &DatasetRef,
        node: &mut DatasetNode,
    ) -> ItemStatus {
        let path = raw.path.clone();
        match &raw.dataset {
            Some(owner) if owner == dataset => {}
            other => {
                let owner = other
                    .as_ref()
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "no dataset".to_string());
                warn!(index, owner = %owner, dataset = %dataset, "File record for another dataset skipped");
                return ItemStatus::skipped(
                    index,
                    format!("file belongs to {}, not {}", owner, dataset),
                )
                .with_path(path);
            }
        }

        let raw_path = path.clone().unwrap_or_default();
        let Some((dirs, name)) = split_leaf_path(&raw_path) else {
            let err = RecordError::InvalidPath { path: raw_path };
            return ItemStatus::from_error(index, &err).with_path(path);
        };

        let (size, url, mut warnings, source) = match self.registry.resolve_record(raw) {
            Ok(translator) => match translator.translate(raw) {
                Ok(translation) => (
                    translation.record.get(fields::CONTENT_BYTE_SIZE).cloned(),
                    translation.record.get(fields::URL).cloned(),
                    issue_messages(index, &translation.issues),
                    translator.identity().to_string(),
                ),
                Err(err) => {
                    let err = RecordError::from(err);
                    warn!(index, error = %err, "File record failed to translate");
                    return ItemStatus::from_error(index, &err).with_path(path);
                }
            },
            Err(_) => {
                let extracted = raw.extracted_metadata();
                let size = extracted.and_then(|m| m.get(fields::CONTENT_BYTE_SIZE)).cloned();
                let url = extracted
                    .and_then(|m| m.get(fields::DISTRIBUTION))
                    .and_then(|d| d.get(fields::URL))
                    .cloned();
                (size, url, Vec::new(), "extracted_metadata".to_string())
            }
        };

        let content_byte_size = match size.as_ref().map(byte_size) {
            Some(Some(size)) => size,
            Some(None) => {
                warnings.push(format!("contentbytesize is not an integer; stored {}", UNKNOWN_SIZE));
                UNKNOWN_SIZE
            }
            None => UNKNOWN_SIZE,
        };
        let url = url
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let outcome = merge_leaf(
            &mut node.children,
            &dirs,
            Leaf::File {
                name,
                content_byte_size,
                url,
            },
        );
        debug!(index, path = %raw_path, outcome = ?outcome, source = %source, "File leaf merged");
        let verb = match outcome {
            MergeOutcome::Inserted => "added",
            MergeOutcome::Updated => "updated",
            MergeOutcome::Unchanged => "unchanged",
        };
        ItemStatus::ok(index, format!("file {} ({})", verb, source))
            .with_path(path)
            .with_warnings(warnings)
    }
}

/// Statuses and partitioned records of one batch.
struct Batch {
    statuses: Vec<Option<ItemStatus>>,
    datasets: Vec<(usize, RawRecord)>,
    files: Vec<(usize, RawRecord)>,
}

impl Batch {
    fn new(len: usize) -> Self {
        Self {
            statuses: vec![None; len],
            datasets: Vec::new(),
            files: Vec::new(),
        }
    }

    fn classify(&mut self, index: usize, item: InputItem, validator: &dyn RecordValidator) {
        let value = match item.value {
            Ok(value) => value,
            Err(err) => return self.record(ItemStatus::from_error(index, &err)),
        };
        let path = value
            .get(fields::PATH)
            .and_then(Value::as_str)
            .map(str::to_string);

        let raw = validator
            .validate(&value)
            .and_then(|_| RawRecord::from_value(value));
        let raw = match raw {
            Ok(raw) => raw,
            Err(err) => {
                let err = RecordError::from(err);
                warn!(index, error = %err, "Record failed validation");
                return self.record(ItemStatus::from_error(index, &err).with_path(path));
            }
        };

        match raw.kind {
            EntityKind::Dataset if raw.dataset.is_some() => self.datasets.push((index, raw)),
            EntityKind::Dataset => self.record(ItemStatus::new(
                index,
                Status::Error,
                "dataset record without dataset_id and dataset_version",
            )),
            EntityKind::File => self.files.push((index, raw)),
            EntityKind::Directory => self.record(
                ItemStatus::skipped(
                    index,
                    "directory records are not placed; directories are derived from file paths",
                )
                .with_path(path),
            ),
        }
    }

    fn record(&mut self, status: ItemStatus) {
        let index = status.index;
        self.statuses[index] = Some(status);
    }

    fn finish(self) -> Vec<ItemStatus> {
        self.statuses
            .into_iter()
            .enumerate()
            .map(|(index, status)| {
                status.unwrap_or_else(|| ItemStatus::new(index, Status::Error, "item was not processed"))
            })
            .collect()
    }
}

/// The single dataset a batch describes.
fn governing_dataset(batch: &Batch) -> Result<DatasetRef, IngestError> {
    let from_datasets: BTreeSet<&DatasetRef> = batch
        .datasets
        .iter()
        .filter_map(|(_, raw)| raw.dataset.as_ref())
        .collect();
    if from_datasets.len() > 1 {
        return Err(IngestError::MultipleSourceDatasets {
            found: from_datasets.into_iter().cloned().collect(),
        });
    }
    if let Some(dataset) = from_datasets.into_iter().next() {
        return Ok(dataset.clone());
    }

    let from_files: BTreeSet<&DatasetRef> = batch
        .files
        .iter()
        .filter_map(|(_, raw)| raw.dataset.as_ref())
        .collect();
    let mut from_files = from_files.into_iter();
    match (from_files.next(), from_files.next()) {
        (Some(dataset), None) => Ok(dataset.clone()),
        _ => Err(IngestError::NoSourceDataset),
    }
}

/// Place every subdataset listed in the node's fields as a dataset leaf.
fn merge_subdatasets(node: &mut DatasetNode, warnings: &mut Vec<String>) {
    for sub in node.subdatasets() {
        let mut dirs = sub.dirs_from_path.clone();
        let Some(name) = dirs.pop() else {
            let message = format!("subdataset {} has no path; not placed in the tree", sub.dataset);
            warn!("{}", message);
            warnings.push(message);
            continue;
        };
        let outcome = merge_leaf(
            &mut node.children,
            &dirs,
            Leaf::Dataset {
                name,
                dataset_id: sub.dataset.dataset_id.clone(),
                dataset_version: sub.dataset.dataset_version.clone(),
            },
        );
        debug!(subdataset = %sub.dataset, path = %sub.dataset_path, outcome = ?outcome, "Subdataset leaf merged");
    }
}

fn parse_children(key: &BlobKey, value: Value) -> Result<Vec<CatalogNode>, StorageError> {
    serde_json::from_value(value).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn byte_size(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn issue_messages(index: usize, issues: &[crate::error::TranslationError]) -> Vec<String> {
    issues
        .iter()
        .map(|issue| {
            warn!(index, issue = %issue, "Translation issue");
            issue.to_string()
        })
        .collect()
}
