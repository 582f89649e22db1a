use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use yac_core::{ProposalHash, PublicKey, VoteMessage, YacHash};

use crate::answer::{Answer, CommitMessage, ProposalState, RejectMessage};
use crate::block_storage::BlockStorage;
use crate::error::ConsensusError;
use crate::supermajority::ConsistencyModel;

/// Two different votes from one voter for the same proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equivocation {
    /// The vote that was counted
    pub counted: VoteMessage,
    /// The later vote that was ignored
    pub conflicting: VoteMessage,
}

/// All votes cast for one proposal in one round, grouped by candidate block.
///
/// Each voter contributes at most one counted vote to the whole proposal,
/// so the sets of voters of the block storages are disjoint. Once the state
/// leaves `Open` it never changes again; later votes are still recorded.
#[derive(Debug)]
pub struct ProposalStorage {
    hash: ProposalHash,
    peers_in_round: u64,
    threshold: u64,
    block_storages: BTreeMap<YacHash, BlockStorage>,
    /// Counted vote of every voter seen so far
    voters: BTreeMap<PublicKey, YacHash>,
    equivocations: BTreeMap<PublicKey, Equivocation>,
    state: ProposalState,
}

impl ProposalStorage {
    /// Storage using the BFT threshold
    pub fn new(hash: ProposalHash, peers_in_round: u64) -> Result<Self, ConsensusError> {
        Self::with_model(hash, peers_in_round, ConsistencyModel::Bft)
    }

    pub fn with_model(
        hash: ProposalHash,
        peers_in_round: u64,
        model: ConsistencyModel,
    ) -> Result<Self, ConsensusError> {
        if peers_in_round == 0 {
            return Err(ConsensusError::EmptyPeerList);
        }
        Ok(ProposalStorage {
            hash,
            peers_in_round,
            threshold: model.threshold(peers_in_round),
            block_storages: BTreeMap::new(),
            voters: BTreeMap::new(),
            equivocations: BTreeMap::new(),
            state: ProposalState::Open,
        })
    }

    pub fn proposal_hash(&self) -> ProposalHash {
        self.hash
    }

    pub fn peers_in_round(&self) -> u64 {
        self.peers_in_round
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn state(&self) -> &ProposalState {
        &self.state
    }

    /// The final answer, if one was reached
    pub fn answer(&self) -> Option<Answer> {
        self.state.answer()
    }

    /// Number of distinct voters seen for this proposal
    pub fn voter_count(&self) -> u64 {
        self.voters.len() as u64
    }

    pub fn block_storage(&self, hash: &YacHash) -> Option<&BlockStorage> {
        self.block_storages.get(hash)
    }

    pub fn block_storages(&self) -> impl Iterator<Item = &BlockStorage> {
        self.block_storages.values()
    }

    pub fn equivocations(&self) -> impl Iterator<Item = &Equivocation> {
        self.equivocations.values()
    }

    /// Insert one vote and return the current answer
    pub fn insert(&mut self, vote: VoteMessage) -> Option<Answer> {
        if !self.should_insert(&vote) {
            return self.answer();
        }

        let hash = vote.hash;
        let voter = *vote.voter();
        let block_state = self.find_store(hash).insert(vote);
        self.voters.insert(voter, hash);

        if !self.state.is_open() {
            debug!("Recorded late vote for {} after final answer", hash);
            return self.answer();
        }

        if let Some(commit) = block_state.commit {
            info!(
                "Supermajority for {}: {}/{} votes",
                hash, block_state.vote_count, self.peers_in_round
            );
            self.state = ProposalState::Committed(commit);
        } else if let Some(reject) = self.find_reject_proof() {
            info!(
                "Proposal {} rejected: {} voters, no block can reach {}",
                self.hash.0.short(),
                self.voters.len(),
                self.threshold
            );
            self.state = ProposalState::Rejected(reject);
        }

        self.answer()
    }

    /// Insert votes in order; equivalent to repeated [`Self::insert`]
    pub fn insert_batch<I>(&mut self, votes: I) -> Option<Answer>
    where
        I: IntoIterator<Item = VoteMessage>,
    {
        for vote in votes {
            self.insert(vote);
        }
        self.answer()
    }

    /// The commit certificate, if the proposal committed
    pub fn commit(&self) -> Option<&CommitMessage> {
        match &self.state {
            ProposalState::Committed(commit) => Some(commit),
            _ => None,
        }
    }

    fn should_insert(&mut self, vote: &VoteMessage) -> bool {
        self.check_proposal_hash(vote) && self.check_peer_uniqueness(vote)
    }

    fn check_proposal_hash(&self, vote: &VoteMessage) -> bool {
        if vote.hash.proposal_hash != self.hash {
            debug!(
                "Ignoring vote from {} for proposal {}, expected {}",
                vote.voter().short(),
                vote.hash.proposal_hash.0.short(),
                self.hash.0.short()
            );
            return false;
        }
        true
    }

    /// One counted vote per voter per proposal. A second vote for another
    /// block is kept as equivocation evidence.
    fn check_peer_uniqueness(&mut self, vote: &VoteMessage) -> bool {
        let voter = vote.voter();
        let Some(counted_hash) = self.voters.get(voter) else {
            return true;
        };

        if *counted_hash == vote.hash {
            debug!("Duplicate vote from {} for {}", voter.short(), vote.hash);
            return false;
        }

        let counted = self
            .block_storages
            .get(counted_hash)
            .and_then(|storage| storage.vote_of(voter))
            .cloned();
        if let Some(counted) = counted {
            warn!(
                "Peer {} equivocated: voted {} then {}",
                voter.short(),
                counted.hash,
                vote.hash
            );
            self.equivocations
                .entry(*voter)
                .or_insert_with(|| Equivocation {
                    counted,
                    conflicting: vote.clone(),
                });
        }
        false
    }

    /// Get-or-create the block storage for `hash`
    fn find_store(&mut self, hash: YacHash) -> &mut BlockStorage {
        let (peers, threshold) = (self.peers_in_round, self.threshold);
        self.block_storages
            .entry(hash)
            .or_insert_with(|| BlockStorage::with_threshold(hash, peers, threshold))
    }

    /// A reject proof exists once even the best candidate plus every peer
    /// that has not voted yet stays below the threshold.
    fn find_reject_proof(&self) -> Option<RejectMessage> {
        let remaining = self.peers_in_round.saturating_sub(self.voter_count());
        let best = self
            .block_storages
            .values()
            .map(BlockStorage::vote_count)
            .max()
            .unwrap_or(0);

        if best.saturating_add(remaining) >= self.threshold {
            return None;
        }

        Some(RejectMessage {
            votes: self
                .block_storages
                .values()
                .flat_map(|storage| storage.votes().cloned())
                .collect(),
        })
    }
}
