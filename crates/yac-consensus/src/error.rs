use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("Peer list is empty; supermajority is undefined")]
    EmptyPeerList,

    #[error("Invalid commit certificate: {0}")]
    InvalidCommit(String),

    #[error("Invalid reject proof: {0}")]
    InvalidReject(String),

    #[error("Insufficient votes: have {have}, need {need}")]
    InsufficientVotes { have: u64, need: u64 },

    #[error("Invalid vote signature from {0}")]
    InvalidSignature(String),

    #[error("Peer not in round: {0}")]
    UnknownPeer(String),

    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("Round {round} is outside the window of current round {current}")]
    RoundOutOfWindow { round: yac_core::Round, current: yac_core::Round },

    #[error("Height mismatch: expected {expected}, got {got}")]
    HeightMismatch { expected: u64, got: u64 },

    #[error("Ledger error: {0}")]
    Ledger(#[from] yac_ledger::LedgerError),

    #[error("Core error: {0}")]
    Core(#[from] yac_core::CoreError),
}
