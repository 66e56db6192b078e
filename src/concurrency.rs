//! Mutual exclusion around a dataset's load → merge → store cycle.
//!
//! Two layers: [`KeyLockManager`] serializes builders inside one process, and
//! [`CatalogLock`] holds an advisory file lock so separate processes targeting the
//! same dataset cannot interleave and lose each other's tree additions.

use crate::error::StorageError;
use crate::store::BlobKey;
use fs4::FileExt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-key lock registry for in-process writers.
pub struct KeyLockManager {
    locks: RwLock<HashMap<BlobKey, Arc<Mutex<()>>>>,
}

impl KeyLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Lock shared by every caller asking for `key`.
    pub fn get_lock(&self, key: &BlobKey) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(key) {
                return lock.clone();
            }
        }

        // Another thread may have inserted between the two lock acquisitions.
        let mut map = self.locks.write();
        // Entries only the map still references belong to finished cycles.
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        map.entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.read().is_empty()
    }
}

impl Default for KeyLockManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive advisory lock on `<dir>/<key>.lock`, released when dropped.
#[derive(Debug)]
pub struct CatalogLock {
    path: PathBuf,
    _file: File,
}

impl CatalogLock {
    /// Block until the lock for `key` is held.
    pub fn acquire(dir: &Path, key: &BlobKey) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
        let path = dir.join(format!("{}.lock", key));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        file.lock_exclusive()
            .map_err(|source| StorageError::LockFailed {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "Catalog lock acquired");
        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        tracing::debug!(path = %self.path.display(), "Catalog lock released");
    }
}
