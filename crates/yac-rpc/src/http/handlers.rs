use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use yac_consensus::{
    verify_votes, Answer, CommitMessage, CommitResponse, ProposeRequest, ProposeResponse,
    RejectMessage, RejectResponse, TxQueue, Validator, VoteRequest, VoteResponse, Yac,
};
use yac_core::{Peer, ProposalHash, Round, Transaction, VoteMessage};
use yac_ledger::{SharedChain, Storage};

use crate::error::RpcError;

/// Application state shared with handlers
pub struct AppState<S: Storage> {
    pub yac: Arc<Yac>,
    pub chain: SharedChain<S>,
    pub validator: Option<Validator>,
    pub tx_queue: Arc<TxQueue>,
    /// Peers that receive gossiped transactions
    pub gossip_peers: Vec<Peer>,
    /// Own vote of every round this node voted in
    pub votes_cast: Mutex<BTreeMap<Round, VoteMessage>>,
}

impl<S: Storage> AppState<S> {
    pub fn new(
        yac: Arc<Yac>,
        chain: SharedChain<S>,
        validator: Option<Validator>,
        tx_queue: Arc<TxQueue>,
        gossip_peers: Vec<Peer>,
    ) -> Self {
        AppState {
            yac,
            chain,
            validator,
            tx_queue,
            gossip_peers,
            votes_cast: Mutex::new(BTreeMap::new()),
        }
    }
}

// Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub height: u64,
    pub head_hash: String,
    pub current_round: Round,
    pub peer_count: usize,
    pub open_proposals: usize,
    pub pending_commits: usize,
    pub queued_transactions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockResponse {
    pub height: u64,
    pub hash: String,
    pub prev_hash: String,
    pub created_time: u64,
    pub proposal_hash: String,
    pub tx_root: String,
    pub tx_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TxSubmitResponse {
    pub hash: String,
    pub status: String,
}

// Request types

#[derive(Debug, Serialize, Deserialize)]
pub struct TxSubmitRequest {
    pub transaction: Transaction,
}

// Handlers

/// Get node status
pub async fn get_status<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<StatusResponse>, RpcError> {
    let status = state.yac.status();

    Ok(Json(StatusResponse {
        height: status.top_height,
        head_hash: status.top_hash,
        current_round: status.current_round,
        peer_count: status.peer_count,
        open_proposals: status.open_proposals,
        pending_commits: status.pending_commits,
        queued_transactions: state.tx_queue.len(),
    }))
}

/// Queue a transaction for the next proposal
pub async fn submit_tx<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(request): Json<TxSubmitRequest>,
) -> Result<Json<TxSubmitResponse>, RpcError> {
    let tx = request.transaction;
    tx.verify_signature()
        .map_err(|e| RpcError::BadRequest(e.to_string()))?;

    let is_gossip = headers
        .get("x-gossip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "1")
        .unwrap_or(false);

    let hash = match state.tx_queue.add(tx.clone()) {
        Ok(hash) => hash,
        Err(yac_consensus::TxQueueError::AlreadyExists) if is_gossip => tx.hash()?,
        Err(e) => return Err(e.into()),
    };

    info!("Transaction {} queued", hash);

    if !is_gossip && !state.gossip_peers.is_empty() {
        let peers = state.gossip_peers.clone();
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            for peer in peers {
                let url = format!("{}/tx", peer.address.trim_end_matches('/'));
                let result = client
                    .post(url)
                    .header("x-gossip", "1")
                    .json(&serde_json::json!({ "transaction": tx }))
                    .send()
                    .await;
                if let Err(e) = result {
                    debug!("Failed to gossip transaction to {}: {}", peer.address, e);
                }
            }
        });
    }

    Ok(Json(TxSubmitResponse {
        hash: hash.to_hex(),
        status: "pending".to_string(),
    }))
}

/// Get a committed block by height
pub async fn get_block<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(height): Path<u64>,
) -> Result<Json<BlockResponse>, RpcError> {
    let chain = state.chain.read();

    let Some(block) = chain.block_at(height) else {
        return Err(RpcError::NotFound(format!(
            "Block at height {} not found",
            height
        )));
    };

    Ok(Json(BlockResponse {
        height: block.height(),
        hash: block.hash()?.to_hex(),
        prev_hash: block.header.prev_hash.to_hex(),
        created_time: block.header.created_time,
        proposal_hash: block.header.proposal_hash.to_hex(),
        tx_root: block.header.tx_root.to_hex(),
        tx_count: block.transactions.len(),
    }))
}

/// Accept votes from a peer
pub async fn submit_votes<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, RpcError> {
    verify_votes(&request.votes)?;

    let accepted = request.votes.len();
    let answer = state.yac.submit_votes(request.votes);
    debug!("Accepted {} votes, answer: {}", accepted, describe(&answer));

    Ok(Json(VoteResponse { accepted, answer }))
}

/// Accept a commit certificate from a peer
pub async fn submit_commit<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(commit): Json<CommitMessage>,
) -> Result<Json<CommitResponse>, RpcError> {
    let answer = state.yac.submit_commit(commit)?;
    let height = state.chain.read().height();

    Ok(Json(CommitResponse {
        status: describe(&answer).to_string(),
        height,
        answer,
    }))
}

/// Accept a reject proof from a peer
pub async fn submit_reject<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(reject): Json<RejectMessage>,
) -> Result<Json<RejectResponse>, RpcError> {
    let answer = state.yac.submit_reject(reject)?;

    Ok(Json(RejectResponse {
        status: describe(&answer).to_string(),
        current_round: state.yac.current_round(),
        answer,
    }))
}

/// Build the block of a proposal, vote for it and return the vote
pub async fn submit_proposal<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<ProposeRequest>,
) -> Result<Json<ProposeResponse>, RpcError> {
    let validator = state
        .validator
        .as_ref()
        .ok_or_else(|| RpcError::BadRequest("Node is not a validator".to_string()))?;

    state.yac.check_proposal_round(&request.round)?;
    let current = state.yac.current_round();

    let (top_height, top_hash) = {
        let chain = state.chain.read();
        (chain.height(), chain.head_hash())
    };
    let (block, vote) =
        validator.vote_on_proposal(request.round, &request.proposal, top_height, top_hash)?;

    // one vote per round, whatever the number of proposals seen
    {
        let mut votes_cast = state.votes_cast.lock();
        votes_cast.retain(|round, _| *round >= current);
        if let Some(previous) = votes_cast.get(&request.round) {
            if previous.hash != vote.hash {
                warn!(
                    "Refusing second proposal {} in round {}",
                    vote.hash, request.round
                );
                return Err(RpcError::BadRequest(format!(
                    "Already voted for {} in round {}",
                    previous.hash, request.round
                )));
            }
            return Ok(Json(ProposeResponse {
                vote: previous.clone(),
            }));
        }
        votes_cast.insert(request.round, vote.clone());
    }

    state.yac.add_candidate(block)?;
    state.yac.submit_vote(vote.clone());
    info!("Voted for {} in round {}", vote.hash, request.round);

    Ok(Json(ProposeResponse { vote }))
}

/// Current answer for a proposal
pub async fn get_answer<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(proposal_hash): Path<String>,
) -> Result<Json<Answer>, RpcError> {
    let hash = ProposalHash::from_hex(&proposal_hash)
        .map_err(|_| RpcError::BadRequest("Invalid proposal hash".to_string()))?;

    state
        .yac
        .current_answer(&hash)
        .map(Json)
        .ok_or_else(|| RpcError::NotFound(format!("No answer for proposal {}", proposal_hash)))
}

fn describe(answer: &Option<Answer>) -> &'static str {
    match answer {
        Some(Answer::Commit(_)) => "committed",
        Some(Answer::Reject(_)) => "rejected",
        None => "pending",
    }
}
