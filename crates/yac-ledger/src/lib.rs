//! Yac Ledger - the block store consumed by consensus
//!
//! Consensus only needs to commit a block and to read the current chain
//! head and peer list. This crate provides those boundary traits together
//! with a simple key-value backed implementation.

pub mod chain;
pub mod error;
pub mod ledger;
pub mod storage;

pub use chain::{Chain, CommitStatus};
pub use error::LedgerError;
pub use ledger::{Ledger, PeerProvider, SharedChain};
pub use storage::{FileStorage, MemoryStorage, Storage};
