use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use yac_consensus::{
    Answer, BlockBuilder, CommitMessage, OutcomeSink, ProposeRequest, ProposeResponse,
    RejectMessage, TxQueue, Validator, VoteRequest, Yac,
};
use yac_core::{Block, Peer, Round, VoteMessage};
use yac_ledger::{Chain, FileStorage, SharedChain};
use yac_rpc::http::AppState;
use yac_rpc::{RpcConfig, RpcServer};

use crate::config::NodeConfig;

/// Stale proposals are swept every this many round ticks
const EVICT_EVERY_TICKS: u64 = 30;

/// The Yac node
pub struct Node {
    config: NodeConfig,
    chain: SharedChain<FileStorage>,
    yac: Arc<Yac>,
    tx_queue: Arc<TxQueue>,
    validator: Option<Validator>,
    peers: Vec<Peer>,
}

/// Clears committed transactions from the queue and logs outcomes
struct QueueSink {
    tx_queue: Arc<TxQueue>,
}

impl OutcomeSink for QueueSink {
    fn on_commit(&self, block: &Block, commit: &CommitMessage) {
        let removed = self.tx_queue.remove_committed(&block.transactions);
        info!(
            "Committed block {} at height {} with {} votes ({} transactions)",
            commit.hash.block_hash,
            block.height(),
            commit.votes.len(),
            removed
        );
    }

    fn on_reject(&self, round: Round, next: Round, reject: &RejectMessage) {
        info!(
            "Round {} rejected with {} votes, moving to {}",
            round,
            reject.votes.len(),
            next
        );
    }

    fn on_timeout(&self, round: Round, next: Round) {
        warn!("Round {} timed out, moving to {}", round, next);
    }
}

impl Node {
    /// Create a new node from configuration
    pub fn new(config: NodeConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating {}", config.data_dir.display()))?;

        let storage = FileStorage::new(config.data_dir.join("chain.bin"))?;
        let mut chain = Chain::new(storage);
        if chain.load_from_storage()? {
            info!("Loaded chain at height {}", chain.height());
        } else {
            chain.init_genesis(config.genesis_peers()?)?;
            info!("Genesis initialized with {} peers", chain.peers().len());
        }
        let peers = chain.peers().to_vec();
        let chain = SharedChain::new(chain);

        let yac = Arc::new(Yac::new(
            config.yac_config(),
            Arc::new(chain.clone()),
            Arc::new(chain.clone()),
        ));
        let tx_queue = Arc::new(TxQueue::new(config.tx_queue_config()));
        yac.set_outcome_sink(Arc::new(QueueSink {
            tx_queue: Arc::clone(&tx_queue),
        }));

        let validator = config
            .keypair()?
            .map(|keypair| Validator::new(keypair, BlockBuilder::new(config.block_builder_config())));

        Ok(Node {
            config,
            chain,
            yac,
            tx_queue,
            validator,
            peers,
        })
    }

    /// Run the node
    pub async fn run(self) -> Result<()> {
        info!("Starting Yac node");

        let driver = match &self.validator {
            Some(validator) if self.peers.iter().any(|p| p.public_key == validator.public_key()) => {
                info!("Starting as peer {}", validator.public_key());
                let driver = RoundDriver {
                    yac: Arc::clone(&self.yac),
                    tx_queue: Arc::clone(&self.tx_queue),
                    validator: validator.clone(),
                    peers: self.peers.clone(),
                    client: reqwest::Client::new(),
                    round_time: self.config.round_time(),
                    round_timeout: self.config.round_timeout(),
                };
                Some(tokio::spawn(driver.run()))
            }
            Some(validator) => {
                warn!(
                    "Key {} is not in the peer list, following only",
                    validator.public_key()
                );
                None
            }
            None => {
                info!("Starting as follower");
                None
            }
        };

        let gossip_peers = self
            .peers
            .iter()
            .filter(|p| Some(p.public_key) != self.validator.as_ref().map(|v| v.public_key()))
            .cloned()
            .collect();
        let app_state = AppState::new(
            Arc::clone(&self.yac),
            self.chain.clone(),
            self.validator.clone(),
            Arc::clone(&self.tx_queue),
            gossip_peers,
        );
        let rpc_config = RpcConfig {
            http_addr: self.config.rpc_addr,
        };
        let result = RpcServer::new(rpc_config, app_state).run().await;

        if let Some(handle) = driver {
            handle.abort();
        }
        result?;
        Ok(())
    }
}

/// Drives rounds: proposes when this peer leads the current round and
/// moves on when a round outlives its timeout.
struct RoundDriver {
    yac: Arc<Yac>,
    tx_queue: Arc<TxQueue>,
    validator: Validator,
    peers: Vec<Peer>,
    client: reqwest::Client,
    round_time: Duration,
    round_timeout: Duration,
}

impl RoundDriver {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.round_time);
        let mut started = (self.yac.current_round(), Instant::now());
        let mut proposed: Option<Round> = None;
        let mut ticks: u64 = 0;

        loop {
            ticker.tick().await;
            ticks += 1;

            self.yac.retry_pending_commits();
            if ticks % EVICT_EVERY_TICKS == 0 {
                let evicted = self.yac.evict_stale();
                if evicted > 0 {
                    debug!("Evicted {} stale proposals", evicted);
                }
            }

            let round = self.yac.current_round();
            if round != started.0 {
                started = (round, Instant::now());
            } else if started.1.elapsed() >= self.round_timeout {
                if let Some(next) = self.yac.on_round_timeout(round) {
                    started = (next, Instant::now());
                }
                continue;
            }

            if proposed != Some(round) && self.validator.is_leader(&round, &self.peers) {
                proposed = Some(round);
                if let Err(e) = self.propose(round).await {
                    warn!("Proposal for round {} failed: {:#}", round, e);
                }
            }
        }
    }

    /// Send a proposal to every peer, then share the votes they returned
    async fn propose(&self, round: Round) -> Result<()> {
        let max = self.validator.block_builder().config().max_transactions;
        let proposal = self.validator.block_builder().build_proposal(
            round.height,
            now_millis(),
            self.tx_queue.peek(max),
        )?;
        let proposal_hash = proposal.hash()?;
        info!(
            "Proposing {} for round {} with {} transactions",
            proposal_hash,
            round,
            proposal.transactions.len()
        );

        let request = ProposeRequest { round, proposal };
        let mut votes: Vec<VoteMessage> = Vec::new();
        for peer in &self.peers {
            match self.post::<_, ProposeResponse>(peer, "yac/propose", &request).await {
                Ok(response) => votes.push(response.vote),
                Err(e) => debug!("Peer {} did not vote: {:#}", peer.public_key.short(), e),
            }
        }
        info!("Collected {} votes for round {}", votes.len(), round);

        self.broadcast("yac/vote", &VoteRequest { votes }).await;

        // peers that closed the round on a different view still get the outcome
        match self.yac.current_answer(&proposal_hash) {
            Some(Answer::Commit(commit)) => {
                info!("Proposal {} committed", proposal_hash);
                self.broadcast("yac/commit", &commit).await;
            }
            Some(Answer::Reject(reject)) => {
                info!("Proposal {} rejected", proposal_hash);
                self.broadcast("yac/reject", &reject).await;
            }
            None => debug!("Proposal {} still open", proposal_hash),
        }
        Ok(())
    }

    async fn broadcast<B: serde::Serialize>(&self, path: &str, body: &B) {
        for peer in &self.peers {
            if let Err(e) = self.post::<_, serde_json::Value>(peer, path, body).await {
                debug!("Failed to send {} to {}: {:#}", path, peer.public_key.short(), e);
            }
        }
    }

    async fn post<B, R>(&self, peer: &Peer, path: &str, body: &B) -> Result<R>
    where
        B: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", peer.address.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .timeout(self.round_time.max(Duration::from_secs(1)))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
