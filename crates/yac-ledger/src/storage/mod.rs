pub mod memory;
pub mod persistent;

use crate::error::LedgerError;

/// Key-value backend for the ledger.
///
/// Writes are staged until `commit`; reads see staged writes.
pub trait Storage: Send + Sync {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn put(&mut self, key: &[u8], value: &[u8]);

    fn delete(&mut self, key: &[u8]);

    /// Make staged writes durable
    fn commit(&mut self) -> Result<(), LedgerError>;

    /// Drop staged writes
    fn rollback(&mut self);

    fn exists(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

pub use memory::MemoryStorage;
pub use persistent::FileStorage;
