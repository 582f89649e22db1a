use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use yac_core::serialize;

use super::{MemoryStorage, Storage};
use crate::error::LedgerError;

/// File-backed storage: a [`MemoryStorage`] flushed to a single snapshot
/// file on every commit.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    inner: MemoryStorage,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Result<Self, LedgerError> {
        let path = path.into();
        let data: BTreeMap<Vec<u8>, Vec<u8>> = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serialize::from_bytes(&bytes)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(LedgerError::Storage(e.to_string())),
        };

        Ok(FileStorage {
            path,
            inner: MemoryStorage::from_data(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write to a temp file, then rename over the snapshot
    fn flush_to_disk(&self) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| LedgerError::Storage(e.to_string()))?;
        }

        let bytes = serialize::to_bytes(self.inner.data())
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &bytes).map_err(|e| LedgerError::Storage(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| LedgerError::Storage(e.to_string()))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.inner.put(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.inner.delete(key);
    }

    fn commit(&mut self) -> Result<(), LedgerError> {
        self.inner.commit()?;
        self.flush_to_disk()
    }

    fn rollback(&mut self) {
        self.inner.rollback();
    }
}
