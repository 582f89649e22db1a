use std::collections::HashSet;

use tracing::{debug, info};
use yac_core::{merkle_root, Block, BlockHash, BlockHeader, Hash, Proposal, Transaction};

use crate::error::ConsensusError;

/// Configuration for block building
#[derive(Debug, Clone)]
pub struct BlockBuilderConfig {
    /// Maximum transactions per proposal and block
    pub max_transactions: usize,
}

impl Default for BlockBuilderConfig {
    fn default() -> Self {
        BlockBuilderConfig {
            max_transactions: 1000,
        }
    }
}

/// Turns transactions into proposals and proposals into candidate blocks.
///
/// Building is deterministic: peers holding the same proposal and the same
/// chain head produce the same block hash.
#[derive(Debug, Clone, Default)]
pub struct BlockBuilder {
    config: BlockBuilderConfig,
}

impl BlockBuilder {
    pub fn new(config: BlockBuilderConfig) -> Self {
        BlockBuilder { config }
    }

    pub fn config(&self) -> &BlockBuilderConfig {
        &self.config
    }

    /// Assemble a proposal for `height` from pending transactions
    pub fn build_proposal(
        &self,
        height: u64,
        created_time: u64,
        pending: Vec<Transaction>,
    ) -> Result<Proposal, ConsensusError> {
        let transactions = self.select(pending)?;
        debug!(
            "Built proposal for height {} with {} transactions",
            height,
            transactions.len()
        );
        Ok(Proposal::new(height, created_time, transactions))
    }

    /// Build the candidate block for `proposal` on top of `prev_hash`
    pub fn build(&self, proposal: &Proposal, prev_hash: BlockHash) -> Result<Block, ConsensusError> {
        let proposal_hash = proposal.hash()?;
        let transactions = self.select(proposal.transactions.clone())?;

        let tx_hashes: Result<Vec<Hash>, _> = transactions.iter().map(|tx| tx.hash()).collect();
        let tx_root = merkle_root(&tx_hashes?);

        let header = BlockHeader {
            height: proposal.height,
            prev_hash,
            created_time: proposal.created_time,
            proposal_hash,
            tx_root,
        };
        let block = Block::new(header, transactions);

        info!(
            "Built block {} at height {} from proposal {}",
            block.hash()?,
            block.height(),
            proposal_hash
        );
        Ok(block)
    }

    /// Drop duplicates and badly signed transactions, keeping first-seen
    /// order, up to the configured maximum
    fn select(&self, pending: Vec<Transaction>) -> Result<Vec<Transaction>, ConsensusError> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        for tx in pending {
            if selected.len() >= self.config.max_transactions {
                break;
            }
            let hash = tx.hash()?;
            if !seen.insert(hash) {
                debug!("Dropping duplicate transaction {}", hash);
                continue;
            }
            if let Err(e) = tx.verify_signature() {
                debug!("Dropping transaction {}: {}", hash, e);
                continue;
            }
            selected.push(tx);
        }

        Ok(selected)
    }
}
