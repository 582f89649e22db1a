use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::debug;
use yac_core::{Hash, PublicKey, Transaction};

/// Configuration for the pending transaction queue
#[derive(Debug, Clone)]
pub struct TxQueueConfig {
    /// Maximum number of queued transactions
    pub max_size: usize,
    /// Maximum queued transactions per creator
    pub max_per_creator: usize,
}

impl Default for TxQueueConfig {
    fn default() -> Self {
        TxQueueConfig {
            max_size: 10_000,
            max_per_creator: 100,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TxQueueError {
    #[error("Transaction already queued")]
    AlreadyExists,

    #[error("Transaction queue is full")]
    QueueFull,

    #[error("Creator has reached the transaction limit")]
    CreatorLimitReached,

    #[error("Invalid transaction")]
    InvalidTransaction,
}

#[derive(Debug, Default)]
struct Inner {
    order: VecDeque<Hash>,
    by_hash: HashMap<Hash, Transaction>,
    per_creator: HashMap<PublicKey, usize>,
}

impl Inner {
    fn remove(&mut self, hash: &Hash) -> Option<Transaction> {
        let tx = self.by_hash.remove(hash)?;
        self.order.retain(|h| h != hash);
        if let Some(count) = self.per_creator.get_mut(&tx.creator) {
            *count -= 1;
            if *count == 0 {
                self.per_creator.remove(&tx.creator);
            }
        }
        Some(tx)
    }
}

/// First-in first-out queue of transactions waiting for a proposal
#[derive(Debug, Default)]
pub struct TxQueue {
    config: TxQueueConfig,
    inner: Mutex<Inner>,
}

impl TxQueue {
    pub fn new(config: TxQueueConfig) -> Self {
        TxQueue {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Queue a signed transaction
    pub fn add(&self, tx: Transaction) -> Result<Hash, TxQueueError> {
        tx.verify_signature()
            .map_err(|_| TxQueueError::InvalidTransaction)?;
        let hash = tx.hash().map_err(|_| TxQueueError::InvalidTransaction)?;

        let mut inner = self.inner.lock();
        if inner.by_hash.contains_key(&hash) {
            return Err(TxQueueError::AlreadyExists);
        }
        if inner.by_hash.len() >= self.config.max_size {
            return Err(TxQueueError::QueueFull);
        }
        let count = inner.per_creator.entry(tx.creator).or_default();
        if *count >= self.config.max_per_creator {
            return Err(TxQueueError::CreatorLimitReached);
        }
        *count += 1;

        inner.order.push_back(hash);
        inner.by_hash.insert(hash, tx);
        debug!("Queued transaction {}", hash);
        Ok(hash)
    }

    /// Oldest `max_count` transactions, left in the queue
    pub fn peek(&self, max_count: usize) -> Vec<Transaction> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .take(max_count)
            .filter_map(|hash| inner.by_hash.get(hash).cloned())
            .collect()
    }

    /// Drop transactions included in a committed block
    pub fn remove_committed(&self, transactions: &[Transaction]) -> usize {
        let mut inner = self.inner.lock();
        let mut removed = 0;
        for tx in transactions {
            let Ok(hash) = tx.hash() else {
                continue;
            };
            if inner.remove(&hash).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("Removed {} committed transactions from the queue", removed);
        }
        removed
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.inner.lock().by_hash.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
