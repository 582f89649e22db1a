//! Yac Consensus - the YAC voting engine
//!
//! Peers vote on `(proposal, block)` pairs. Votes are grouped per block
//! ([`BlockStorage`]), per proposal ([`ProposalStorage`]) and per round
//! ([`VoteStorage`]). A block commits once a supermajority of distinct
//! peers voted for it; a proposal is rejected once no block can get there.
//! The [`Yac`] dispatcher acts on those answers.

pub mod answer;
pub mod block_builder;
pub mod block_storage;
pub mod certificate;
pub mod error;
pub mod events;
pub mod net;
pub mod proposal_storage;
pub mod supermajority;
pub mod tx_queue;
pub mod validator;
pub mod vote_storage;
pub mod yac;

pub use answer::{Answer, CommitMessage, ProposalState, RejectMessage};
pub use block_builder::{BlockBuilder, BlockBuilderConfig};
pub use block_storage::{BlockState, BlockStorage};
pub use certificate::{verify_commit, verify_reject, verify_votes};
pub use error::ConsensusError;
pub use events::OutcomeSink;
pub use net::{
    CommitResponse, ProposeRequest, ProposeResponse, RejectResponse, VoteRequest, VoteResponse,
};
pub use proposal_storage::{Equivocation, ProposalStorage};
pub use supermajority::ConsistencyModel;
pub use tx_queue::{TxQueue, TxQueueConfig, TxQueueError};
pub use validator::{leader_for, Validator, VoteSigner};
pub use vote_storage::{RoundEntry, VoteStorage, VoteStorageConfig};
pub use yac::{DispatchOutcome, Yac, YacConfig, YacStatus};
