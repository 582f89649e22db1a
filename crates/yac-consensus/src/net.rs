use serde::{Deserialize, Serialize};
use yac_core::{Proposal, Round, VoteMessage};

use crate::answer::Answer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub votes: Vec<VoteMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub accepted: usize,
    pub answer: Option<Answer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeRequest {
    pub round: Round,
    pub proposal: Proposal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeResponse {
    pub vote: VoteMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResponse {
    pub status: String,
    pub height: u64,
    pub answer: Option<Answer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectResponse {
    pub status: String,
    pub current_round: Round,
    pub answer: Option<Answer>,
}
