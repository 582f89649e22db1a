use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use yac_consensus::{BlockBuilderConfig, ConsistencyModel, TxQueueConfig, YacConfig};
use yac_core::{KeyPair, Peer, PublicKey, SecretKey};

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node data directory
    pub data_dir: PathBuf,

    /// RPC bind address
    pub rpc_addr: SocketAddr,

    /// Interval between round checks in milliseconds
    pub round_time_ms: u64,

    /// A round without an answer after this long moves to the next reject round
    pub round_timeout_ms: u64,

    /// How many heights ahead of the current one votes are accepted for
    pub max_future_heights: u64,

    pub consistency_model: ConsistencyModel,

    /// Block builder max transactions
    pub max_block_txs: usize,

    pub tx_queue_max_size: usize,

    pub tx_queue_max_per_creator: usize,

    /// Genesis peer list, in leader order
    pub peers: Vec<PeerConfig>,

    /// Peer private key (hex). Nodes without one follow the chain but do not vote.
    pub peer_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    pub public_key: String,
    pub address: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            data_dir: PathBuf::from("./yac-data"),
            rpc_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            round_time_ms: 1000,
            round_timeout_ms: 10_000,
            max_future_heights: 2,
            consistency_model: ConsistencyModel::Bft,
            max_block_txs: 1000,
            tx_queue_max_size: 10_000,
            tx_queue_max_per_creator: 100,
            peers: Vec::new(),
            peer_key: None,
        }
    }
}

impl NodeConfig {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: NodeConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn genesis_peers(&self) -> Result<Vec<Peer>> {
        self.peers
            .iter()
            .map(|peer| {
                let public_key = PublicKey::from_hex(&peer.public_key)
                    .with_context(|| format!("invalid peer key {}", peer.public_key))?;
                Ok(Peer::new(public_key, peer.address.clone()))
            })
            .collect()
    }

    pub fn keypair(&self) -> Result<Option<KeyPair>> {
        let Some(key_hex) = &self.peer_key else {
            return Ok(None);
        };
        let secret = SecretKey::from_hex(key_hex).context("invalid peer key")?;
        Ok(Some(KeyPair::from_secret(secret)))
    }

    pub fn round_time(&self) -> Duration {
        Duration::from_millis(self.round_time_ms)
    }

    pub fn round_timeout(&self) -> Duration {
        Duration::from_millis(self.round_timeout_ms)
    }

    pub fn yac_config(&self) -> YacConfig {
        YacConfig {
            model: self.consistency_model,
            max_future_heights: self.max_future_heights,
            round_timeout: self.round_timeout(),
            ..Default::default()
        }
    }

    pub fn block_builder_config(&self) -> BlockBuilderConfig {
        BlockBuilderConfig {
            max_transactions: self.max_block_txs,
        }
    }

    pub fn tx_queue_config(&self) -> TxQueueConfig {
        TxQueueConfig {
            max_size: self.tx_queue_max_size,
            max_per_creator: self.tx_queue_max_per_creator,
        }
    }
}

/// Configurations for `count` peers on localhost, RPC ports counting up
/// from `base_port`. Every config carries the full peer list and its own key.
pub fn generate_local_network(count: usize, base_port: u16) -> Vec<NodeConfig> {
    let keys: Vec<KeyPair> = (0..count).map(|_| KeyPair::generate()).collect();
    let addrs: Vec<SocketAddr> = (0..count)
        .map(|i| SocketAddr::from(([127, 0, 0, 1], base_port + i as u16)))
        .collect();

    let peers: Vec<PeerConfig> = keys
        .iter()
        .zip(&addrs)
        .map(|(kp, addr)| PeerConfig {
            public_key: kp.public.to_hex(),
            address: format!("http://{}", addr),
        })
        .collect();

    keys.iter()
        .zip(&addrs)
        .enumerate()
        .map(|(i, (kp, addr))| NodeConfig {
            data_dir: PathBuf::from(format!("./yac-data/node{}", i)),
            rpc_addr: *addr,
            peers: peers.clone(),
            peer_key: Some(kp.secret.to_hex()),
            ..Default::default()
        })
        .collect()
}
