use std::sync::Arc;

use parking_lot::RwLock;
use yac_core::{Block, BlockHash, Peer};

use crate::chain::{Chain, CommitStatus};
use crate::error::LedgerError;
use crate::storage::Storage;

/// Block commit boundary used by the consensus dispatcher.
///
/// `commit_block` must be idempotent: committing the same block again
/// succeeds.
pub trait Ledger: Send + Sync {
    fn commit_block(&self, block: &Block) -> Result<CommitStatus, LedgerError>;

    fn top_height(&self) -> u64;

    fn top_hash(&self) -> BlockHash;
}

/// Supplies the ordered peer list voting at a height
pub trait PeerProvider: Send + Sync {
    fn peers(&self, height: u64) -> Vec<Peer>;
}

/// A [`Chain`] shared between the node, the RPC layer and consensus
pub struct SharedChain<S: Storage> {
    inner: Arc<RwLock<Chain<S>>>,
}

impl<S: Storage> Clone for SharedChain<S> {
    fn clone(&self) -> Self {
        SharedChain {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Storage> SharedChain<S> {
    pub fn new(chain: Chain<S>) -> Self {
        SharedChain {
            inner: Arc::new(RwLock::new(chain)),
        }
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, Chain<S>> {
        self.inner.read()
    }

    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, Chain<S>> {
        self.inner.write()
    }
}

impl<S: Storage> Ledger for SharedChain<S> {
    fn commit_block(&self, block: &Block) -> Result<CommitStatus, LedgerError> {
        self.inner.write().commit_block(block)
    }

    fn top_height(&self) -> u64 {
        self.inner.read().height()
    }

    fn top_hash(&self) -> BlockHash {
        self.inner.read().head_hash()
    }
}

/// Peer membership is fixed at genesis; peer-management commands belong to
/// the transaction layer.
impl<S: Storage> PeerProvider for SharedChain<S> {
    fn peers(&self, _height: u64) -> Vec<Peer> {
        self.inner.read().peers().to_vec()
    }
}
