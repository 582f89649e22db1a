use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::Hash;

/// Digest identifying a proposal: an ordered candidate set of transactions
/// for one height.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct ProposalHash(pub Hash);

/// Digest identifying one concrete candidate block built from a proposal
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct BlockHash(pub Hash);

impl ProposalHash {
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Hash::from_hex(s).map(ProposalHash)
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl BlockHash {
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Hash::from_hex(s).map(BlockHash)
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl fmt::Debug for ProposalHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalHash({})", self.0.short())
    }
}

impl fmt::Display for ProposalHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.0.short())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `(proposal, block)` pair a vote endorses
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct YacHash {
    pub proposal_hash: ProposalHash,
    pub block_hash: BlockHash,
}

impl YacHash {
    pub fn new(proposal_hash: ProposalHash, block_hash: BlockHash) -> Self {
        YacHash {
            proposal_hash,
            block_hash,
        }
    }
}

impl fmt::Debug for YacHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "YacHash({}/{})",
            self.proposal_hash.0.short(),
            self.block_hash.0.short()
        )
    }
}

impl fmt::Display for YacHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.proposal_hash.0.short(),
            self.block_hash.0.short()
        )
    }
}
