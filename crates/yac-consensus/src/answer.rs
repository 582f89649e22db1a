use serde::{Deserialize, Serialize};
use yac_core::{Round, VoteMessage, YacHash};

/// Votes of a supermajority for one [`YacHash`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage {
    pub hash: YacHash,
    pub votes: Vec<VoteMessage>,
}

/// Every vote observed for a proposal once no candidate block can reach
/// supermajority any more
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectMessage {
    pub votes: Vec<VoteMessage>,
}

/// Final outcome of a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Answer {
    Commit(CommitMessage),
    Reject(RejectMessage),
}

impl Answer {
    pub fn votes(&self) -> &[VoteMessage] {
        match self {
            Answer::Commit(commit) => &commit.votes,
            Answer::Reject(reject) => &reject.votes,
        }
    }

    /// Round of the evidence; `None` only for an empty vote set
    pub fn round(&self) -> Option<Round> {
        self.votes().first().map(|vote| vote.round)
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, Answer::Commit(_))
    }
}

/// Lifecycle of a proposal: `Open` until a terminal answer is reached.
/// The terminal states are absorbing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProposalState {
    #[default]
    Open,
    Committed(CommitMessage),
    Rejected(RejectMessage),
}

impl ProposalState {
    pub fn is_open(&self) -> bool {
        matches!(self, ProposalState::Open)
    }

    pub fn answer(&self) -> Option<Answer> {
        match self {
            ProposalState::Open => None,
            ProposalState::Committed(commit) => Some(Answer::Commit(commit.clone())),
            ProposalState::Rejected(reject) => Some(Answer::Reject(reject.clone())),
        }
    }
}

impl From<Answer> for ProposalState {
    fn from(answer: Answer) -> Self {
        match answer {
            Answer::Commit(commit) => ProposalState::Committed(commit),
            Answer::Reject(reject) => ProposalState::Rejected(reject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yac_core::{hash_blake3, BlockHash, KeyPair, ProposalHash};

    #[test]
    fn test_answer_json_is_tagged() {
        let hash = YacHash::new(
            ProposalHash(hash_blake3(b"p")),
            BlockHash(hash_blake3(b"b")),
        );
        let vote = VoteMessage::new_signed(Round::new(2, 0), hash, &KeyPair::from_seed(1)).unwrap();
        let answer = Answer::Commit(CommitMessage {
            hash,
            votes: vec![vote],
        });

        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["type"], "commit");

        let back: Answer = serde_json::from_value(json).unwrap();
        assert_eq!(back, answer);
        assert_eq!(back.round(), Some(Round::new(2, 0)));
    }

    #[test]
    fn test_state_to_answer() {
        assert_eq!(ProposalState::Open.answer(), None);

        let reject = Answer::Reject(RejectMessage { votes: vec![] });
        let state = ProposalState::from(reject.clone());
        assert!(!state.is_open());
        assert_eq!(state.answer(), Some(reject));
    }
}
