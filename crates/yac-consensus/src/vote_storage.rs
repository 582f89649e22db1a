use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use yac_core::{ProposalHash, Round, VoteMessage};

use crate::answer::Answer;
use crate::error::ConsensusError;
use crate::proposal_storage::ProposalStorage;
use crate::supermajority::ConsistencyModel;

/// Configuration for the round index
#[derive(Debug, Clone)]
pub struct VoteStorageConfig {
    pub model: ConsistencyModel,
    /// Votes for heights further ahead than this are dropped
    pub max_future_heights: u64,
    /// Entries idle for longer than this are evicted
    pub round_timeout: Duration,
}

impl Default for VoteStorageConfig {
    fn default() -> Self {
        VoteStorageConfig {
            model: ConsistencyModel::Bft,
            max_future_heights: 2,
            round_timeout: Duration::from_secs(30),
        }
    }
}

/// A proposal storage and the last time it received a vote
#[derive(Debug)]
pub struct RoundEntry {
    pub storage: ProposalStorage,
    pub last_activity: Instant,
}

type Key = (Round, ProposalHash);

#[derive(Debug)]
struct Index {
    entries: HashMap<Key, Arc<Mutex<RoundEntry>>>,
    /// Lowest height still accepting votes
    current_height: u64,
    /// Rounds at `current_height` or above that were retired
    closed: BTreeSet<Round>,
}

impl Index {
    fn is_live(&self, round: &Round, max_future_heights: u64) -> bool {
        round.height >= self.current_height
            && round.height - self.current_height <= max_future_heights
            && !self.closed.contains(round)
    }
}

/// Round index: `(Round, ProposalHash)` to the proposal storage collecting
/// its votes.
///
/// The index lock is only held to look up, create or drop entries. Votes
/// are inserted under the per-entry lock, so distinct proposals proceed in
/// parallel.
#[derive(Debug)]
pub struct VoteStorage {
    config: VoteStorageConfig,
    index: RwLock<Index>,
}

impl VoteStorage {
    /// Create an index accepting votes from `current_height` on
    pub fn new(config: VoteStorageConfig, current_height: u64) -> Self {
        VoteStorage {
            config,
            index: RwLock::new(Index {
                entries: HashMap::new(),
                current_height,
                closed: BTreeSet::new(),
            }),
        }
    }

    pub fn config(&self) -> &VoteStorageConfig {
        &self.config
    }

    pub fn current_height(&self) -> u64 {
        self.index.read().current_height
    }

    /// Whether votes for `round` are still accepted
    pub fn is_live(&self, round: &Round) -> bool {
        self.index
            .read()
            .is_live(round, self.config.max_future_heights)
    }

    /// Route a vote to its proposal storage, creating the storage on first
    /// sight. Votes for rounds that are not live are ignored.
    pub fn store(
        &self,
        vote: VoteMessage,
        peers_in_round: u64,
    ) -> Result<Option<Answer>, ConsensusError> {
        let round = vote.round;
        let key = (round, vote.hash.proposal_hash);

        let Some(entry) = self.find_or_create(key, peers_in_round)? else {
            debug!(
                "Ignoring vote from {} for round {} outside the live window",
                vote.voter().short(),
                round
            );
            return Ok(None);
        };

        let mut entry = entry.lock();
        entry.last_activity = Instant::now();
        Ok(entry.storage.insert(vote))
    }

    fn find_or_create(
        &self,
        key: Key,
        peers_in_round: u64,
    ) -> Result<Option<Arc<Mutex<RoundEntry>>>, ConsensusError> {
        let max_future = self.config.max_future_heights;
        {
            let index = self.index.read();
            if !index.is_live(&key.0, max_future) {
                return Ok(None);
            }
            if let Some(entry) = index.entries.get(&key) {
                return Ok(Some(Arc::clone(entry)));
            }
        }

        let mut index = self.index.write();
        // the window may have moved while the lock was released
        if !index.is_live(&key.0, max_future) {
            return Ok(None);
        }
        if let Some(entry) = index.entries.get(&key) {
            return Ok(Some(Arc::clone(entry)));
        }

        let storage = ProposalStorage::with_model(key.1, peers_in_round, self.config.model)?;
        debug!(
            "Opened proposal {} in round {} with {} peers",
            key.1.0.short(),
            key.0,
            peers_in_round
        );
        let entry = Arc::new(Mutex::new(RoundEntry {
            storage,
            last_activity: Instant::now(),
        }));
        index.entries.insert(key, Arc::clone(&entry));
        Ok(Some(entry))
    }

    /// Answer of one proposal in one round
    pub fn answer(&self, round: &Round, proposal_hash: &ProposalHash) -> Option<Answer> {
        let entry = self.index.read().entries.get(&(*round, *proposal_hash)).cloned()?;
        let answer = entry.lock().storage.answer();
        answer
    }

    /// Answer of a proposal in any open round, latest round first
    pub fn find_answer(&self, proposal_hash: &ProposalHash) -> Option<(Round, Answer)> {
        let mut candidates: Vec<(Round, Arc<Mutex<RoundEntry>>)> = self
            .index
            .read()
            .entries
            .iter()
            .filter(|((_, hash), _)| hash == proposal_hash)
            .map(|((round, _), entry)| (*round, Arc::clone(entry)))
            .collect();
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        candidates.into_iter().find_map(|(round, entry)| {
            let answer = entry.lock().storage.answer();
            answer.map(|answer| (round, answer))
        })
    }

    /// Run `f` against the storage of one proposal
    pub fn with_storage<R>(
        &self,
        round: &Round,
        proposal_hash: &ProposalHash,
        f: impl FnOnce(&ProposalStorage) -> R,
    ) -> Option<R> {
        let entry = self.index.read().entries.get(&(*round, *proposal_hash)).cloned()?;
        let guard = entry.lock();
        let result = f(&guard.storage);
        Some(result)
    }

    /// Retire every proposal of `round`; later votes for it are ignored
    pub fn close_round(&self, round: Round) -> usize {
        let mut index = self.index.write();
        let before = index.entries.len();
        index.entries.retain(|(r, _), _| *r != round);
        if round.height >= index.current_height {
            index.closed.insert(round);
        }
        let removed = before - index.entries.len();
        debug!("Closed round {}, retired {} proposals", round, removed);
        removed
    }

    /// Abandon every round below `height`
    pub fn advance_to(&self, height: u64) -> usize {
        let mut index = self.index.write();
        if height <= index.current_height {
            return 0;
        }
        index.current_height = height;

        let before = index.entries.len();
        index.entries.retain(|(round, _), _| round.height >= height);
        index.closed.retain(|round| round.height >= height);
        let removed = before - index.entries.len();

        info!("Vote storage advanced to height {}, dropped {} proposals", height, removed);
        removed
    }

    /// Drop entries idle for longer than the round timeout
    pub fn evict_stale(&self, now: Instant) -> usize {
        let timeout = self.config.round_timeout;
        let mut index = self.index.write();
        let before = index.entries.len();
        index.entries.retain(|_, entry| {
            // an entry locked by an in-flight insert is active
            match entry.try_lock() {
                Some(entry) => now.saturating_duration_since(entry.last_activity) <= timeout,
                None => true,
            }
        });
        let removed = before - index.entries.len();
        if removed > 0 {
            debug!("Evicted {} idle proposals", removed);
        }
        removed
    }

    /// Number of open proposals
    pub fn len(&self) -> usize {
        self.index.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rounds with at least one open proposal, ascending
    pub fn rounds(&self) -> Vec<Round> {
        let rounds: BTreeSet<Round> = self.index.read().entries.keys().map(|(r, _)| *r).collect();
        rounds.into_iter().collect()
    }
}
