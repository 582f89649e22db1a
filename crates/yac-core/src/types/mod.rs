pub mod block;
pub mod peer;
pub mod proposal;
pub mod round;
pub mod transaction;
pub mod vote;
pub mod yac_hash;

pub use block::{Block, BlockHeader};
pub use peer::Peer;
pub use proposal::Proposal;
pub use round::Round;
pub use transaction::Transaction;
pub use vote::{VoteMessage, VoteSignature};
pub use yac_hash::{BlockHash, ProposalHash, YacHash};
