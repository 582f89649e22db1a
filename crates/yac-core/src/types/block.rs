use serde::{Deserialize, Serialize};

use crate::crypto::{hash_blake3, merkle_root, Hash};
use crate::error::CoreError;
use crate::serialize;
use crate::types::transaction::Transaction;
use crate::types::yac_hash::{BlockHash, ProposalHash};

/// Block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height (0 for genesis)
    pub height: u64,
    /// Hash of the previous block (zeros for genesis)
    pub prev_hash: BlockHash,
    /// Creation time copied from the proposal
    pub created_time: u64,
    /// Proposal this block was built from
    pub proposal_hash: ProposalHash,
    /// Merkle root of transactions
    pub tx_root: Hash,
}

impl BlockHeader {
    pub fn hash(&self) -> Result<BlockHash, CoreError> {
        let bytes = serialize::to_bytes(self)?;
        Ok(BlockHash(hash_blake3(&bytes)))
    }
}

/// A candidate or committed block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Block {
            header,
            transactions,
        }
    }

    /// The empty block at height 0
    pub fn genesis() -> Self {
        Block::new(
            BlockHeader {
                height: 0,
                prev_hash: BlockHash::default(),
                created_time: 0,
                proposal_hash: ProposalHash::default(),
                tx_root: Hash::ZERO,
            },
            Vec::new(),
        )
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Hash of the header
    pub fn hash(&self) -> Result<BlockHash, CoreError> {
        self.header.hash()
    }

    pub fn compute_tx_root(&self) -> Result<Hash, CoreError> {
        let hashes = self
            .transactions
            .iter()
            .map(Transaction::hash)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(merkle_root(&hashes))
    }

    pub fn verify_tx_root(&self) -> Result<bool, CoreError> {
        Ok(self.compute_tx_root()? == self.header.tx_root)
    }
}
