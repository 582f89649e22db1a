use std::collections::BTreeMap;

use super::Storage;
use crate::error::LedgerError;

/// In-memory storage. Also the working set of [`super::FileStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    /// `None` marks a staged delete
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_data(data: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        MemoryStorage {
            data,
            staged: BTreeMap::new(),
        }
    }

    pub(crate) fn data(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.staged.get(key) {
            Some(staged) => staged.clone(),
            None => self.data.get(key).cloned(),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.staged.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn delete(&mut self, key: &[u8]) {
        self.staged.insert(key.to_vec(), None);
    }

    fn commit(&mut self) -> Result<(), LedgerError> {
        for (key, value) in std::mem::take(&mut self.staged) {
            match value {
                Some(v) => self.data.insert(key, v),
                None => self.data.remove(&key),
            };
        }
        Ok(())
    }

    fn rollback(&mut self) {
        self.staged.clear();
    }
}
