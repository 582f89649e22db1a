use serde::{Deserialize, Serialize};

use crate::crypto::{hash_blake3, merkle_root, Hash};
use crate::error::CoreError;
use crate::serialize;
use crate::types::transaction::Transaction;
use crate::types::yac_hash::ProposalHash;

/// Ordered candidate set of transactions for one height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub height: u64,
    /// Unix milliseconds, set by the proposing peer
    pub created_time: u64,
    pub transactions: Vec<Transaction>,
}

impl Proposal {
    pub fn new(height: u64, created_time: u64, transactions: Vec<Transaction>) -> Self {
        Proposal {
            height,
            created_time,
            transactions,
        }
    }

    pub fn tx_root(&self) -> Result<Hash, CoreError> {
        let hashes = self
            .transactions
            .iter()
            .map(Transaction::hash)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(merkle_root(&hashes))
    }

    pub fn hash(&self) -> Result<ProposalHash, CoreError> {
        let bytes = serialize::to_bytes(&(self.height, self.created_time, self.tx_root()?))?;
        Ok(ProposalHash(hash_blake3(&bytes)))
    }
}
