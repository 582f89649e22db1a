use std::collections::BTreeMap;

use tracing::debug;
use yac_core::{PublicKey, VoteMessage, YacHash};

use crate::answer::CommitMessage;
use crate::error::ConsensusError;
use crate::supermajority::ConsistencyModel;

/// Snapshot of a [`BlockStorage`] after an insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub hash: YacHash,
    pub vote_count: u64,
    /// Set once the distinct-voter count reached the threshold
    pub commit: Option<CommitMessage>,
}

/// Votes for a single `(proposal, block)` pair.
///
/// At most one vote per voter is kept. All stored votes carry `hash`.
#[derive(Debug, Clone)]
pub struct BlockStorage {
    hash: YacHash,
    peers_in_round: u64,
    threshold: u64,
    votes: BTreeMap<PublicKey, VoteMessage>,
}

impl BlockStorage {
    pub fn new(
        hash: YacHash,
        peers_in_round: u64,
        model: ConsistencyModel,
    ) -> Result<Self, ConsensusError> {
        if peers_in_round == 0 {
            return Err(ConsensusError::EmptyPeerList);
        }
        Ok(Self::with_threshold(
            hash,
            peers_in_round,
            model.threshold(peers_in_round),
        ))
    }

    pub(crate) fn with_threshold(hash: YacHash, peers_in_round: u64, threshold: u64) -> Self {
        BlockStorage {
            hash,
            peers_in_round,
            threshold,
            votes: BTreeMap::new(),
        }
    }

    pub fn hash(&self) -> &YacHash {
        &self.hash
    }

    pub fn peers_in_round(&self) -> u64 {
        self.peers_in_round
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn vote_count(&self) -> u64 {
        self.votes.len() as u64
    }

    pub fn contains_voter(&self, voter: &PublicKey) -> bool {
        self.votes.contains_key(voter)
    }

    pub fn vote_of(&self, voter: &PublicKey) -> Option<&VoteMessage> {
        self.votes.get(voter)
    }

    /// Stored votes ordered by voter key
    pub fn votes(&self) -> impl Iterator<Item = &VoteMessage> {
        self.votes.values()
    }

    pub fn is_committed(&self) -> bool {
        self.vote_count() >= self.threshold
    }

    /// Add a vote. A vote for another hash or a second vote from a known
    /// voter leaves the storage unchanged.
    pub fn insert(&mut self, vote: VoteMessage) -> BlockState {
        // Routing in ProposalStorage guarantees the hash; a mismatch is a bug.
        debug_assert_eq!(vote.hash, self.hash, "vote routed to the wrong block storage");
        if vote.hash != self.hash {
            return self.state();
        }

        let voter = *vote.voter();
        if self.votes.contains_key(&voter) {
            debug!("Duplicate vote from {} for {}", voter.short(), self.hash);
            return self.state();
        }

        self.votes.insert(voter, vote);
        debug!(
            "Vote from {} for {}: {}/{}",
            voter.short(),
            self.hash,
            self.votes.len(),
            self.threshold
        );

        self.state()
    }

    pub fn state(&self) -> BlockState {
        BlockState {
            hash: self.hash,
            vote_count: self.vote_count(),
            commit: self.is_committed().then(|| CommitMessage {
                hash: self.hash,
                votes: self.votes.values().cloned().collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yac_core::{hash_blake3, BlockHash, KeyPair, ProposalHash, Round};

    fn yac_hash(block: &[u8]) -> YacHash {
        YacHash::new(
            ProposalHash(hash_blake3(b"proposal")),
            BlockHash(hash_blake3(block)),
        )
    }

    fn vote(seed: u8, hash: YacHash) -> VoteMessage {
        VoteMessage::new_signed(Round::new(1, 0), hash, &KeyPair::from_seed(seed)).unwrap()
    }

    #[test]
    fn test_zero_peers_is_a_construction_error() {
        let result = BlockStorage::new(yac_hash(b"a"), 0, ConsistencyModel::Bft);
        assert!(matches!(result, Err(ConsensusError::EmptyPeerList)));
    }

    #[test]
    fn test_commit_exactly_at_threshold() {
        let hash = yac_hash(b"a");
        let mut storage = BlockStorage::new(hash, 4, ConsistencyModel::Bft).unwrap();

        assert!(storage.insert(vote(1, hash)).commit.is_none());
        assert!(storage.insert(vote(2, hash)).commit.is_none());

        let state = storage.insert(vote(3, hash));
        let commit = state.commit.expect("third of four votes commits");
        assert_eq!(commit.hash, hash);
        assert_eq!(commit.votes.len(), 3);
        assert_eq!(state.vote_count, 3);
    }

    #[test]
    fn test_duplicate_vote_is_idempotent() {
        let hash = yac_hash(b"a");
        let mut storage = BlockStorage::new(hash, 4, ConsistencyModel::Bft).unwrap();

        let v = vote(1, hash);
        storage.insert(v.clone());
        let state = storage.insert(v);

        assert_eq!(state.vote_count, 1);
        assert_eq!(storage.vote_count(), 1);
    }

    #[test]
    fn test_single_voter_cannot_reach_threshold_alone() {
        let hash = yac_hash(b"a");
        let mut storage = BlockStorage::new(hash, 4, ConsistencyModel::Bft).unwrap();

        // same voter, distinct signatures over different rounds
        let peer = KeyPair::from_seed(1);
        for r in 0..5 {
            let v = VoteMessage::new_signed(Round::new(1, r), hash, &peer).unwrap();
            storage.insert(v);
        }

        assert_eq!(storage.vote_count(), 1);
        assert!(!storage.is_committed());
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_foreign_hash_is_ignored_in_release() {
        let hash = yac_hash(b"a");
        let mut storage = BlockStorage::new(hash, 4, ConsistencyModel::Bft).unwrap();

        let state = storage.insert(vote(1, yac_hash(b"b")));
        assert_eq!(state.vote_count, 0);
    }

    #[test]
    #[should_panic(expected = "wrong block storage")]
    #[cfg(debug_assertions)]
    fn test_foreign_hash_is_a_routing_bug() {
        let hash = yac_hash(b"a");
        let mut storage = BlockStorage::new(hash, 4, ConsistencyModel::Bft).unwrap();
        storage.insert(vote(1, yac_hash(b"b")));
    }
}
