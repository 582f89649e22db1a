use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Ledger has no genesis block")]
    NotInitialized,

    #[error("A different block is already committed at height {0}")]
    Conflict(u64),

    #[error("Block height mismatch: expected {expected}, got {got}")]
    HeightGap { expected: u64, got: u64 },

    #[error("Previous hash mismatch at height {0}")]
    PrevHashMismatch(u64),

    #[error("Transaction root mismatch at height {0}")]
    InvalidTxRoot(u64),

    #[error("Core error: {0}")]
    Core(#[from] yac_core::CoreError),
}
