use serde::{Deserialize, Serialize};
use std::fmt;

/// One attempt at agreeing on a height.
///
/// Ordered by height first, then by reject round: every reject at a height
/// opens the next reject round at that same height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Round {
    pub height: u64,
    pub reject_round: u32,
}

impl Round {
    pub fn new(height: u64, reject_round: u32) -> Self {
        Round {
            height,
            reject_round,
        }
    }

    /// First round of the following height
    pub fn next_height(&self) -> Self {
        Round::new(self.height + 1, 0)
    }

    /// Retry at the same height after a reject
    pub fn next_reject(&self) -> Self {
        Round::new(self.height, self.reject_round.saturating_add(1))
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.height, self.reject_round)
    }
}
