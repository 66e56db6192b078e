//! File-backed blob store: one `<key>.json` per blob in a flat directory.
//!
//! Every write goes to a temporary file in the same directory, is synced, then
//! renamed over the target, so readers see either the previous document or the
//! new one and never a partial write.

use super::{BlobKey, BlobStore};
use crate::error::StorageError;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Per-process sequence for temp file names; the pid alone collides between threads.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &BlobKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn write_atomic(&self, path: &Path, document: &Value) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;
        let bytes =
            serde_json::to_vec(document).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = self
            .dir
            .join(format!(
                ".{}.tmp-{}-{}",
                file_name,
                std::process::id(),
                TMP_SEQ.fetch_add(1, Ordering::Relaxed)
            ));
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::io(&tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::io(path, e));
        }
        sync_dir(&self.dir);
        debug!(path = %path.display(), bytes = bytes.len(), "Blob written");
        Ok(())
    }
}

fn read_json(path: &Path, label: &str) -> Result<Option<Value>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            key: label.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

impl BlobStore for FsBlobStore {
    fn load(&self, key: &BlobKey) -> Result<Option<Value>, StorageError> {
        read_json(&self.path_for(key), key.as_str())
    }

    fn store(&self, key: &BlobKey, document: &Value) -> Result<(), StorageError> {
        self.write_atomic(&self.path_for(key), document)
    }

    fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let path = self.path_for(key);
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn location(&self, key: &BlobKey) -> String {
        self.path_for(key).display().to_string()
    }

    fn write_pointer(&self, name: &str, document: &Value) -> Result<String, StorageError> {
        let path = self.dir.join(name);
        self.write_atomic(&path, document)?;
        Ok(path.display().to_string())
    }

    fn read_pointer(&self, name: &str) -> Result<Option<Value>, StorageError> {
        read_json(&self.dir.join(name), name)
    }
}
