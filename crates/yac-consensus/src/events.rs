use yac_core::{Block, Round};

use crate::answer::{CommitMessage, RejectMessage};

/// Receives round outcomes once the dispatcher has acted on them
pub trait OutcomeSink: Send + Sync {
    /// `block` was written to the ledger
    fn on_commit(&self, block: &Block, commit: &CommitMessage);

    /// `round` was rejected and voting continues in `next`
    fn on_reject(&self, round: Round, next: Round, reject: &RejectMessage);

    /// `round` timed out without an answer
    fn on_timeout(&self, _round: Round, _next: Round) {}
}
