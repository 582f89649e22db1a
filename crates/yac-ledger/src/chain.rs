use std::collections::BTreeMap;

use yac_core::{serialize, Block, BlockHash, Peer};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::storage::Storage;

/// Key layout
mod keys {
    pub const BLOCK: &[u8] = b"blk:";
    pub const PEERS: &[u8] = b"chain:peers";
    pub const HEIGHT: &[u8] = b"chain:height";

    pub fn block(height: u64) -> Vec<u8> {
        [BLOCK, &height.to_be_bytes()].concat()
    }
}

/// Result of a successful [`Chain::commit_block`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    /// The block extended the chain
    Committed,
    /// The same block was already at that height
    AlreadyCommitted,
}

/// The committed chain: blocks by height plus the genesis peer list
pub struct Chain<S: Storage> {
    storage: S,
    blocks: BTreeMap<u64, Block>,
    head_hash: BlockHash,
    peers: Vec<Peer>,
}

impl<S: Storage> Chain<S> {
    pub fn new(storage: S) -> Self {
        Chain {
            storage,
            blocks: BTreeMap::new(),
            head_hash: BlockHash::default(),
            peers: Vec::new(),
        }
    }

    /// Write the genesis block and the initial peer list
    pub fn init_genesis(&mut self, peers: Vec<Peer>) -> Result<(), LedgerError> {
        info!("Initializing genesis with {} peers", peers.len());

        let genesis = Block::genesis();
        let peers_bytes = encode(&peers)?;
        self.storage.put(keys::PEERS, &peers_bytes);
        self.write_block(&genesis)?;
        self.storage.commit()?;

        self.head_hash = genesis.hash()?;
        self.blocks.clear();
        self.blocks.insert(0, genesis);
        self.peers = peers;
        Ok(())
    }

    /// Rebuild the in-memory view. Returns `false` when storage holds no chain.
    pub fn load_from_storage(&mut self) -> Result<bool, LedgerError> {
        let Some(height_bytes) = self.storage.get(keys::HEIGHT) else {
            return Ok(false);
        };
        let height: u64 = decode(&height_bytes)?;

        let peers_bytes = self
            .storage
            .get(keys::PEERS)
            .ok_or(LedgerError::NotInitialized)?;
        self.peers = decode(&peers_bytes)?;

        self.blocks.clear();
        for h in 0..=height {
            let bytes = self
                .storage
                .get(&keys::block(h))
                .ok_or_else(|| LedgerError::Storage(format!("missing block {}", h)))?;
            self.blocks.insert(h, decode(&bytes)?);
        }
        self.head_hash = self.blocks[&height].hash()?;

        info!("Loaded chain at height {}", height);
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        !self.blocks.is_empty()
    }

    pub fn height(&self) -> u64 {
        self.blocks.keys().next_back().copied().unwrap_or(0)
    }

    pub fn head_hash(&self) -> BlockHash {
        self.head_hash
    }

    pub fn block_at(&self, height: u64) -> Option<&Block> {
        self.blocks.get(&height)
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Append a block. Re-committing the block already stored at its height
    /// is accepted without change, so callers may retry freely.
    pub fn commit_block(&mut self, block: &Block) -> Result<CommitStatus, LedgerError> {
        if !self.is_initialized() {
            return Err(LedgerError::NotInitialized);
        }

        let hash = block.hash()?;
        let height = block.height();

        if let Some(existing) = self.blocks.get(&height) {
            if existing.hash()? == hash {
                debug!("Block {} already committed at height {}", hash.0.short(), height);
                return Ok(CommitStatus::AlreadyCommitted);
            }
            return Err(LedgerError::Conflict(height));
        }

        let expected = self.height() + 1;
        if height != expected {
            return Err(LedgerError::HeightGap {
                expected,
                got: height,
            });
        }
        if block.header.prev_hash != self.head_hash {
            return Err(LedgerError::PrevHashMismatch(height));
        }
        if !block.verify_tx_root()? {
            return Err(LedgerError::InvalidTxRoot(height));
        }

        if let Err(e) = self.write_block(block).and_then(|_| self.storage.commit()) {
            self.storage.rollback();
            return Err(e);
        }

        self.blocks.insert(height, block.clone());
        self.head_hash = hash;

        info!(
            "Committed block {} at height {} ({} txs)",
            hash.0.short(),
            height,
            block.transactions.len()
        );
        Ok(CommitStatus::Committed)
    }

    fn write_block(&mut self, block: &Block) -> Result<(), LedgerError> {
        let bytes = encode(block)?;
        let height = block.height();
        self.storage.put(&keys::block(height), &bytes);
        self.storage.put(keys::HEIGHT, &encode(&height)?);
        Ok(())
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    serialize::to_bytes(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, LedgerError> {
    serialize::from_bytes(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
}
