use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use yac_core::{Block, BlockHash, ProposalHash, Round, VoteMessage};
use yac_ledger::{Ledger, PeerProvider};

use crate::answer::{Answer, CommitMessage, RejectMessage};
use crate::certificate::{verify_commit, verify_reject};
use crate::error::ConsensusError;
use crate::events::OutcomeSink;
use crate::proposal_storage::ProposalStorage;
use crate::supermajority::ConsistencyModel;
use crate::vote_storage::{VoteStorage, VoteStorageConfig};

/// Configuration for the dispatcher
#[derive(Debug, Clone)]
pub struct YacConfig {
    pub model: ConsistencyModel,
    pub max_future_heights: u64,
    pub round_timeout: Duration,
    /// Number of finalized answers kept for `current_answer` lookups
    pub answer_history: usize,
    /// Candidate blocks held at once; the oldest is dropped first
    pub max_candidates: usize,
    /// How many reject rounds ahead of the current round a proposal may be
    pub max_future_reject_rounds: u32,
}

impl Default for YacConfig {
    fn default() -> Self {
        YacConfig {
            model: ConsistencyModel::Bft,
            max_future_heights: 2,
            round_timeout: Duration::from_secs(30),
            answer_history: 64,
            max_candidates: 64,
            max_future_reject_rounds: 4,
        }
    }
}

impl YacConfig {
    fn vote_storage(&self) -> VoteStorageConfig {
        VoteStorageConfig {
            model: self.model,
            max_future_heights: self.max_future_heights,
            round_timeout: self.round_timeout,
        }
    }
}

/// What the dispatcher did with an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The block was written to the ledger and voting moved to `next`
    Committed { round: Round, block: Block, next: Round },
    /// The winning block is not held locally; the commit stays pending
    BlockMissing { round: Round, block_hash: BlockHash },
    /// The ledger refused the block; the commit stays pending
    CommitFailed { round: Round, block_hash: BlockHash, error: String },
    /// The round was rejected and voting moved to `next`
    Rejected { round: Round, next: Round },
}

/// Snapshot for status queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YacStatus {
    pub current_round: Round,
    pub top_height: u64,
    pub top_hash: String,
    pub peer_count: usize,
    pub open_proposals: usize,
    pub pending_commits: usize,
    pub candidate_blocks: usize,
}

/// A commit waiting for its block or for the ledger
#[derive(Debug, Clone)]
struct PendingCommit {
    round: Round,
    commit: CommitMessage,
}

/// Candidate blocks in arrival order
#[derive(Debug, Default)]
struct Candidates {
    blocks: HashMap<BlockHash, Block>,
    order: VecDeque<BlockHash>,
}

impl Candidates {
    /// Returns false if the block was already held
    fn insert(&mut self, block_hash: BlockHash, block: Block, capacity: usize) -> bool {
        if self.blocks.contains_key(&block_hash) {
            return false;
        }
        self.blocks.insert(block_hash, block);
        self.order.push_back(block_hash);
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.blocks.remove(&oldest);
                debug!("Dropped candidate {}", oldest);
            }
        }
        true
    }

    fn get(&self, block_hash: &BlockHash) -> Option<&Block> {
        self.blocks.get(block_hash)
    }

    /// Keep only blocks at `height` or above
    fn retain_from(&mut self, height: u64) {
        self.blocks.retain(|_, block| block.height() >= height);
        let blocks = &self.blocks;
        self.order.retain(|hash| blocks.contains_key(hash));
    }

    fn len(&self) -> usize {
        self.blocks.len()
    }
}

#[derive(Debug)]
struct DispatchState {
    current_round: Round,
    candidates: Candidates,
    pending_commits: BTreeMap<u64, PendingCommit>,
    /// Recently finalized answers, oldest first
    finalized: VecDeque<(Round, ProposalHash, Answer)>,
}

enum Notification {
    Commit(Block, CommitMessage),
    Reject(Round, Round, RejectMessage),
    Timeout(Round, Round),
}

/// Outcome dispatcher: feeds votes into the round index, commits winning
/// blocks through the ledger and moves the current round forward.
pub struct Yac {
    config: YacConfig,
    votes: VoteStorage,
    ledger: Arc<dyn Ledger>,
    peers: Arc<dyn PeerProvider>,
    sink: RwLock<Option<Arc<dyn OutcomeSink>>>,
    state: Mutex<DispatchState>,
}

impl Yac {
    /// Start voting at the height after the ledger head
    pub fn new(config: YacConfig, ledger: Arc<dyn Ledger>, peers: Arc<dyn PeerProvider>) -> Self {
        let current_round = Round::new(ledger.top_height() + 1, 0);
        info!("Starting YAC at round {}", current_round);

        Yac {
            votes: VoteStorage::new(config.vote_storage(), current_round.height),
            config,
            ledger,
            peers,
            sink: RwLock::new(None),
            state: Mutex::new(DispatchState {
                current_round,
                candidates: Candidates::default(),
                pending_commits: BTreeMap::new(),
                finalized: VecDeque::new(),
            }),
        }
    }

    pub fn set_outcome_sink(&self, sink: Arc<dyn OutcomeSink>) {
        *self.sink.write() = Some(sink);
    }

    pub fn config(&self) -> &YacConfig {
        &self.config
    }

    pub fn current_round(&self) -> Round {
        self.state.lock().current_round
    }

    pub fn vote_storage(&self) -> &VoteStorage {
        &self.votes
    }

    /// Proposal hash of a storage
    pub fn proposal_hash(storage: &ProposalStorage) -> ProposalHash {
        storage.proposal_hash()
    }

    /// Whether a proposal for `round` may be voted on: not behind the
    /// current round and not too far ahead of it
    pub fn check_proposal_round(&self, round: &Round) -> Result<(), ConsensusError> {
        let current = self.current_round();
        let too_far = if round.height == current.height {
            round.reject_round > current.reject_round + self.config.max_future_reject_rounds
        } else {
            round.height > current.height + self.config.max_future_heights
        };
        if *round < current || too_far {
            return Err(ConsensusError::RoundOutOfWindow {
                round: *round,
                current,
            });
        }
        Ok(())
    }

    /// Register a candidate block. A pending commit waiting for it is
    /// applied right away.
    pub fn add_candidate(&self, block: Block) -> Result<BlockHash, ConsensusError> {
        let block_hash = block.hash()?;
        let height = block.height();

        let outcome = {
            let mut state = self.state.lock();
            let current = state.current_round.height;
            if height < current || height > current + self.config.max_future_heights {
                debug!(
                    "Ignoring candidate {} at height {}, current height {}",
                    block_hash, height, current
                );
                return Ok(block_hash);
            }
            if state
                .candidates
                .insert(block_hash, block, self.config.max_candidates)
            {
                debug!("Added candidate {} at height {}", block_hash, height);
            }

            let waiting = state
                .pending_commits
                .get(&height)
                .filter(|pending| pending.commit.hash.block_hash == block_hash)
                .cloned();
            waiting.map(|pending| self.apply_commit(&mut state, pending.round, pending.commit))
        };

        if let Some(outcome) = outcome {
            self.notify(outcome.1);
        }
        Ok(block_hash)
    }

    /// Candidate block by hash
    pub fn candidate(&self, block_hash: &BlockHash) -> Option<Block> {
        self.state.lock().candidates.get(block_hash).cloned()
    }

    /// Feed one authenticated vote; returns the answer of its proposal
    pub fn submit_vote(&self, vote: VoteMessage) -> Option<Answer> {
        let round = vote.round;
        let proposal_hash = vote.hash.proposal_hash;

        let peers = self.peers.peers(round.height);
        if !peers.iter().any(|peer| &peer.public_key == vote.voter()) {
            debug!(
                "Ignoring vote from {} outside the peer list of round {}",
                vote.voter().short(),
                round
            );
            return None;
        }

        let answer = match self.votes.store(vote, peers.len() as u64) {
            Ok(answer) => answer?,
            Err(e) => {
                warn!("Cannot store vote for round {}: {}", round, e);
                return None;
            }
        };

        self.dispatch(round, proposal_hash, &answer);
        Some(answer)
    }

    /// Feed votes in order; returns the last answer produced
    pub fn submit_votes<I>(&self, votes: I) -> Option<Answer>
    where
        I: IntoIterator<Item = VoteMessage>,
    {
        let mut last = None;
        for vote in votes {
            if let Some(answer) = self.submit_vote(vote) {
                last = Some(answer);
            }
        }
        last
    }

    /// Feed a commit certificate received from another peer.
    ///
    /// A verified certificate is final even when this node left its round
    /// behind, e.g. after rejecting the round on a split it observed.
    pub fn submit_commit(&self, commit: CommitMessage) -> Result<Option<Answer>, ConsensusError> {
        let Some(round) = commit.votes.first().map(|vote| vote.round) else {
            return Err(ConsensusError::InvalidCommit("no votes".to_string()));
        };
        let peers = self.peers.peers(round.height);
        verify_commit(&commit, &peers, self.config.model)?;

        let answer = self.submit_votes(commit.votes.clone());
        if matches!(answer, Some(Answer::Commit(_))) {
            return Ok(answer);
        }
        Ok(self.dispatch_certificate(Answer::Commit(commit)))
    }

    /// Feed a reject proof received from another peer
    pub fn submit_reject(&self, reject: RejectMessage) -> Result<Option<Answer>, ConsensusError> {
        let Some(round) = reject.votes.first().map(|vote| vote.round) else {
            return Err(ConsensusError::InvalidReject("no votes".to_string()));
        };
        let peers = self.peers.peers(round.height);
        verify_reject(&reject, &peers, self.config.model)?;

        let answer = self.submit_votes(reject.votes.clone());
        if answer.is_some() {
            return Ok(answer);
        }
        Ok(self.dispatch_certificate(Answer::Reject(reject)))
    }

    /// Dispatch verified evidence that the round index did not finalize
    /// itself. Stale evidence yields the answer already known, if any.
    fn dispatch_certificate(&self, answer: Answer) -> Option<Answer> {
        let round = answer.round()?;
        let proposal_hash = answer.votes().first()?.hash.proposal_hash;

        let current = self.current_round();
        if round.height > current.height + self.config.max_future_heights {
            debug!("Ignoring certificate for round {}, current {}", round, current);
            return None;
        }

        match self.dispatch(round, proposal_hash, &answer) {
            Some(_) => Some(answer),
            None => self.current_answer(&proposal_hash),
        }
    }

    /// Latest answer known for a proposal
    pub fn current_answer(&self, proposal_hash: &ProposalHash) -> Option<Answer> {
        if let Some((_, answer)) = self.votes.find_answer(proposal_hash) {
            return Some(answer);
        }
        let state = self.state.lock();
        state
            .finalized
            .iter()
            .rev()
            .find(|(_, hash, _)| hash == proposal_hash)
            .map(|(_, _, answer)| answer.clone())
    }

    /// Retry every pending commit whose block is now available
    pub fn retry_pending_commits(&self) -> Vec<DispatchOutcome> {
        let results: Vec<(DispatchOutcome, Option<Notification>)> = {
            let mut state = self.state.lock();
            let pending: Vec<PendingCommit> = state.pending_commits.values().cloned().collect();
            let mut results = Vec::new();
            for pending in pending {
                // an earlier retry may have advanced past this height
                if pending.round.height < state.current_round.height {
                    continue;
                }
                results.push(self.apply_commit(&mut state, pending.round, pending.commit));
            }
            results
        };

        results
            .into_iter()
            .map(|(outcome, notification)| {
                self.notify(notification);
                outcome
            })
            .collect()
    }

    /// Give up on `round` if it is still current; voting moves on to the
    /// next reject round. Returns the new current round.
    pub fn on_round_timeout(&self, round: Round) -> Option<Round> {
        let next = {
            let mut state = self.state.lock();
            if state.current_round != round {
                return None;
            }
            let next = round.next_reject();
            state.current_round = next;
            next
        };

        info!("Round {} timed out, moving to {}", round, next);
        self.notify(Some(Notification::Timeout(round, next)));
        Some(next)
    }

    /// Drop idle proposals from the round index
    pub fn evict_stale(&self) -> usize {
        self.votes.evict_stale(Instant::now())
    }

    pub fn status(&self) -> YacStatus {
        let (current_round, pending_commits, candidate_blocks) = {
            let state = self.state.lock();
            (
                state.current_round,
                state.pending_commits.len(),
                state.candidates.len(),
            )
        };
        YacStatus {
            current_round,
            top_height: self.ledger.top_height(),
            top_hash: self.ledger.top_hash().to_hex(),
            peer_count: self.peers.peers(current_round.height).len(),
            open_proposals: self.votes.len(),
            pending_commits,
            candidate_blocks,
        }
    }

    fn dispatch(&self, round: Round, proposal_hash: ProposalHash, answer: &Answer) -> Option<DispatchOutcome> {
        let (outcome, notification) = {
            let mut state = self.state.lock();
            let current = state.current_round;

            match answer {
                Answer::Commit(commit) => {
                    if round.height < current.height {
                        debug!("Stale commit for round {}, current {}", round, current);
                        return None;
                    }
                    if state.pending_commits.contains_key(&round.height) {
                        return None;
                    }
                    Self::remember(&mut state, self.config.answer_history, round, proposal_hash, answer);
                    self.apply_commit(&mut state, round, commit.clone())
                }
                Answer::Reject(reject) => {
                    if round.height != current.height || round < current {
                        debug!("Stale reject for round {}, current {}", round, current);
                        return None;
                    }
                    Self::remember(&mut state, self.config.answer_history, round, proposal_hash, answer);
                    self.votes.close_round(round);
                    let next = round.next_reject();
                    state.current_round = next;
                    info!("Round {} rejected, moving to {}", round, next);
                    (
                        DispatchOutcome::Rejected { round, next },
                        Some(Notification::Reject(round, next, reject.clone())),
                    )
                }
            }
        };

        self.notify(notification);
        Some(outcome)
    }

    /// Write the winning block to the ledger. Runs under the state lock.
    fn apply_commit(
        &self,
        state: &mut DispatchState,
        round: Round,
        commit: CommitMessage,
    ) -> (DispatchOutcome, Option<Notification>) {
        let block_hash = commit.hash.block_hash;

        let Some(block) = state.candidates.get(&block_hash).cloned() else {
            warn!("Committed block {} for round {} is not held locally", block_hash, round);
            state
                .pending_commits
                .insert(round.height, PendingCommit { round, commit });
            return (DispatchOutcome::BlockMissing { round, block_hash }, None);
        };

        if let Err(e) = self.ledger.commit_block(&block) {
            warn!("Failed to commit block {} at height {}: {}", block_hash, block.height(), e);
            state
                .pending_commits
                .insert(round.height, PendingCommit { round, commit });
            return (
                DispatchOutcome::CommitFailed {
                    round,
                    block_hash,
                    error: e.to_string(),
                },
                None,
            );
        }

        let next = Round::new(block.height(), 0).next_height();
        state.current_round = state.current_round.max(next);
        state.candidates.retain_from(next.height);
        state.pending_commits.retain(|height, _| *height >= next.height);
        self.votes.advance_to(next.height);

        info!(
            "Committed block {} at height {} with {} votes",
            block_hash,
            block.height(),
            commit.votes.len()
        );

        (
            DispatchOutcome::Committed {
                round,
                block: block.clone(),
                next,
            },
            Some(Notification::Commit(block, commit)),
        )
    }

    fn remember(
        state: &mut DispatchState,
        capacity: usize,
        round: Round,
        proposal_hash: ProposalHash,
        answer: &Answer,
    ) {
        state.finalized.push_back((round, proposal_hash, answer.clone()));
        while state.finalized.len() > capacity {
            state.finalized.pop_front();
        }
    }

    /// Called without the state lock held
    fn notify(&self, notification: Option<Notification>) {
        let Some(notification) = notification else {
            return;
        };
        let Some(sink) = self.sink.read().clone() else {
            return;
        };
        match notification {
            Notification::Commit(block, commit) => sink.on_commit(&block, &commit),
            Notification::Reject(round, next, reject) => sink.on_reject(round, next, &reject),
            Notification::Timeout(round, next) => sink.on_timeout(round, next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yac_core::{KeyPair, Peer, Proposal, YacHash};
    use yac_ledger::{Chain, MemoryStorage, SharedChain};

    use crate::block_builder::BlockBuilder;

    struct Net {
        keys: Vec<KeyPair>,
        chain: SharedChain<MemoryStorage>,
        yac: Yac,
    }

    fn net(n: u8) -> Net {
        let keys: Vec<_> = (1..=n).map(KeyPair::from_seed).collect();
        let peers = keys
            .iter()
            .map(|kp| Peer::new(kp.public, "http://127.0.0.1:0"))
            .collect();
        let mut chain = Chain::new(MemoryStorage::new());
        chain.init_genesis(peers).unwrap();
        let chain = SharedChain::new(chain);
        let yac = Yac::new(
            YacConfig::default(),
            Arc::new(chain.clone()),
            Arc::new(chain.clone()),
        );
        Net { keys, chain, yac }
    }

    fn candidate(net: &Net, created_time: u64) -> (Block, YacHash) {
        let proposal = Proposal::new(net.chain.top_height() + 1, created_time, vec![]);
        let block = BlockBuilder::default()
            .build(&proposal, net.chain.top_hash())
            .unwrap();
        let hash = YacHash::new(proposal.hash().unwrap(), block.hash().unwrap());
        (block, hash)
    }

    fn vote(kp: &KeyPair, round: Round, hash: YacHash) -> VoteMessage {
        VoteMessage::new_signed(round, hash, kp).unwrap()
    }

    #[test]
    fn test_commit_advances_height() {
        let net = net(4);
        let (block, hash) = candidate(&net, 1);
        let round = net.yac.current_round();
        net.yac.add_candidate(block.clone()).unwrap();

        let answer = net
            .yac
            .submit_votes(net.keys[..3].iter().map(|kp| vote(kp, round, hash)));

        assert!(matches!(answer, Some(Answer::Commit(_))));
        assert_eq!(net.chain.top_height(), 1);
        assert_eq!(net.chain.top_hash(), block.hash().unwrap());
        assert_eq!(net.yac.current_round(), Round::new(2, 0));
        assert!(net.yac.vote_storage().is_empty());

        // answer survives the retired round
        assert_eq!(net.yac.current_answer(&hash.proposal_hash), answer);
    }

    #[test]
    fn test_late_vote_after_commit_is_ignored() {
        let net = net(4);
        let (block, hash) = candidate(&net, 1);
        let round = net.yac.current_round();
        net.yac.add_candidate(block).unwrap();
        net.yac
            .submit_votes(net.keys[..3].iter().map(|kp| vote(kp, round, hash)));

        assert_eq!(net.yac.submit_vote(vote(&net.keys[3], round, hash)), None);
        assert_eq!(net.chain.top_height(), 1);
    }

    #[test]
    fn test_outsider_vote_is_ignored() {
        let net = net(1);
        let (_, hash) = candidate(&net, 1);
        let outsider = KeyPair::from_seed(42);

        let answer = net.yac.submit_vote(vote(&outsider, Round::new(1, 0), hash));
        assert_eq!(answer, None);
        assert!(net.yac.vote_storage().is_empty());
    }

    #[test]
    fn test_commit_without_block_is_pending() {
        let net = net(4);
        let (block, hash) = candidate(&net, 1);
        let round = net.yac.current_round();

        let answer = net
            .yac
            .submit_votes(net.keys[..3].iter().map(|kp| vote(kp, round, hash)));
        assert!(matches!(answer, Some(Answer::Commit(_))));
        assert_eq!(net.chain.top_height(), 0);
        assert_eq!(net.yac.status().pending_commits, 1);

        // the block arrives later
        net.yac.add_candidate(block).unwrap();
        assert_eq!(net.chain.top_height(), 1);
        assert_eq!(net.yac.status().pending_commits, 0);
        assert_eq!(net.yac.current_round(), Round::new(2, 0));
    }

    #[test]
    fn test_reject_moves_to_next_reject_round() {
        let net = net(4);
        let (block_a, a) = candidate(&net, 1);
        let block_b = {
            let mut b = block_a.clone();
            b.header.created_time = 2;
            b
        };
        let b = YacHash::new(a.proposal_hash, block_b.hash().unwrap());
        let round = net.yac.current_round();

        net.yac.submit_vote(vote(&net.keys[0], round, a));
        net.yac.submit_vote(vote(&net.keys[1], round, b));
        net.yac.submit_vote(vote(&net.keys[2], round, a));
        let answer = net.yac.submit_vote(vote(&net.keys[3], round, b));

        assert!(matches!(answer, Some(Answer::Reject(_))));
        assert_eq!(net.yac.current_round(), round.next_reject());
        assert!(!net.yac.vote_storage().is_live(&round));
        assert_eq!(net.chain.top_height(), 0);
    }

    #[test]
    fn test_round_timeout() {
        let net = net(4);
        let round = net.yac.current_round();

        assert_eq!(net.yac.on_round_timeout(round), Some(round.next_reject()));
        // a second timer for the same round is stale
        assert_eq!(net.yac.on_round_timeout(round), None);
        assert_eq!(net.yac.current_round(), Round::new(1, 1));
    }

    #[test]
    fn test_submit_commit_from_peer() {
        let net = net(4);
        let (block, hash) = candidate(&net, 1);
        net.yac.add_candidate(block).unwrap();

        let commit = CommitMessage {
            hash,
            votes: net.keys[1..].iter().map(|kp| vote(kp, Round::new(1, 0), hash)).collect(),
        };
        let answer = net.yac.submit_commit(commit).unwrap();

        assert!(matches!(answer, Some(Answer::Commit(_))));
        assert_eq!(net.chain.top_height(), 1);
    }

    #[test]
    fn test_submit_commit_after_local_reject() {
        let net = net(4);
        let (block_a, a) = candidate(&net, 1);
        let mut block_b = block_a.clone();
        block_b.header.created_time = 2;
        let b = YacHash::new(a.proposal_hash, block_b.hash().unwrap());
        let round = net.yac.current_round();
        net.yac.add_candidate(block_a.clone()).unwrap();

        // peer 4 signs both blocks; this node sees a 2/2 split
        net.yac.submit_vote(vote(&net.keys[0], round, a));
        net.yac.submit_vote(vote(&net.keys[1], round, a));
        net.yac.submit_vote(vote(&net.keys[2], round, b));
        let local = net.yac.submit_vote(vote(&net.keys[3], round, b));
        assert!(matches!(local, Some(Answer::Reject(_))));
        assert_eq!(net.yac.current_round(), Round::new(1, 1));

        let commit = CommitMessage {
            hash: a,
            votes: [0, 1, 3].iter().map(|&i| vote(&net.keys[i], round, a)).collect(),
        };
        let answer = net.yac.submit_commit(commit).unwrap();

        assert!(matches!(answer, Some(Answer::Commit(ref c)) if c.hash == a));
        assert_eq!(net.chain.top_height(), 1);
        assert_eq!(net.chain.top_hash(), block_a.hash().unwrap());
        assert_eq!(net.yac.current_round(), Round::new(2, 0));
        assert!(matches!(
            net.yac.current_answer(&a.proposal_hash),
            Some(Answer::Commit(_))
        ));
    }

    #[test]
    fn test_submit_reject_from_peer() {
        let net = net(4);
        let (block_a, a) = candidate(&net, 1);
        let mut block_b = block_a;
        block_b.header.created_time = 2;
        let b = YacHash::new(a.proposal_hash, block_b.hash().unwrap());
        let round = net.yac.current_round();

        let unfinished = RejectMessage {
            votes: vec![
                vote(&net.keys[0], round, a),
                vote(&net.keys[1], round, a),
                vote(&net.keys[2], round, b),
            ],
        };
        assert!(matches!(
            net.yac.submit_reject(unfinished),
            Err(ConsensusError::InvalidReject(_))
        ));
        assert_eq!(net.yac.current_round(), round);

        let reject = RejectMessage {
            votes: vec![
                vote(&net.keys[0], round, a),
                vote(&net.keys[1], round, b),
                vote(&net.keys[2], round, a),
                vote(&net.keys[3], round, b),
            ],
        };
        let answer = net.yac.submit_reject(reject).unwrap();
        assert!(matches!(answer, Some(Answer::Reject(_))));
        assert_eq!(net.yac.current_round(), round.next_reject());
        assert_eq!(net.chain.top_height(), 0);
    }

    #[test]
    fn test_candidates_are_bounded() {
        let net = net(4);
        let capacity = net.yac.config().max_candidates;

        let hashes: Vec<BlockHash> = (0..capacity as u64 + 10)
            .map(|t| net.yac.add_candidate(candidate(&net, t).0).unwrap())
            .collect();

        assert_eq!(net.yac.status().candidate_blocks, capacity);
        assert!(net.yac.candidate(&hashes[0]).is_none());
        assert!(net.yac.candidate(&hashes[hashes.len() - 1]).is_some());

        // far future heights are not held at all
        let proposal = Proposal::new(10, 1, vec![]);
        let future = BlockBuilder::default()
            .build(&proposal, net.chain.top_hash())
            .unwrap();
        let future_hash = net.yac.add_candidate(future).unwrap();
        assert!(net.yac.candidate(&future_hash).is_none());
    }

    #[test]
    fn test_proposal_round_window() {
        let net = net(4);
        let max_ahead = net.yac.config().max_future_reject_rounds;

        assert!(net.yac.check_proposal_round(&Round::new(1, 0)).is_ok());
        assert!(net.yac.check_proposal_round(&Round::new(1, max_ahead)).is_ok());
        assert!(matches!(
            net.yac.check_proposal_round(&Round::new(1, max_ahead + 1)),
            Err(ConsensusError::RoundOutOfWindow { .. })
        ));
        assert!(net.yac.check_proposal_round(&Round::new(0, 5)).is_err());

        net.yac.on_round_timeout(Round::new(1, 0));
        assert!(net.yac.check_proposal_round(&Round::new(1, 0)).is_err());
        assert!(net.yac.check_proposal_round(&Round::new(1, max_ahead + 1)).is_ok());
    }

    #[test]
    fn test_submit_commit_below_threshold() {
        let net = net(4);
        let (_, hash) = candidate(&net, 1);
        let commit = CommitMessage {
            hash,
            votes: net.keys[..2].iter().map(|kp| vote(kp, Round::new(1, 0), hash)).collect(),
        };

        assert!(matches!(
            net.yac.submit_commit(commit),
            Err(ConsensusError::InsufficientVotes { .. })
        ));
        assert!(net.yac.vote_storage().is_empty());
    }

    #[test]
    fn test_status() {
        let net = net(4);
        let status = net.yac.status();
        assert_eq!(status.current_round, Round::new(1, 0));
        assert_eq!(status.top_height, 0);
        assert_eq!(status.peer_count, 4);
        assert_eq!(status.open_proposals, 0);
    }
}
