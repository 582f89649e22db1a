use std::collections::{BTreeMap, HashSet};

use yac_core::{Peer, PublicKey, VoteMessage};

use crate::answer::{CommitMessage, RejectMessage};
use crate::error::ConsensusError;
use crate::supermajority::ConsistencyModel;

/// Check the signature of every vote
pub fn verify_votes(votes: &[VoteMessage]) -> Result<(), ConsensusError> {
    for vote in votes {
        vote.verify()
            .map_err(|_| ConsensusError::InvalidSignature(vote.voter().to_hex()))?;
    }
    Ok(())
}

/// Votes of one round from distinct members with valid signatures.
/// Returns the distinct voters.
fn verify_evidence<'a>(
    votes: &'a [VoteMessage],
    peers: &[Peer],
    invalid: fn(String) -> ConsensusError,
) -> Result<HashSet<&'a PublicKey>, ConsensusError> {
    let Some(first) = votes.first() else {
        return Err(invalid("no votes".to_string()));
    };
    if peers.is_empty() {
        return Err(ConsensusError::EmptyPeerList);
    }

    let members: HashSet<&PublicKey> = peers.iter().map(|peer| &peer.public_key).collect();
    let mut voters = HashSet::new();

    for vote in votes {
        if vote.round != first.round {
            return Err(invalid(format!(
                "votes from rounds {} and {}",
                first.round, vote.round
            )));
        }
        if vote.hash.proposal_hash != first.hash.proposal_hash {
            return Err(invalid("votes for different proposals".to_string()));
        }
        if !members.contains(vote.voter()) {
            return Err(ConsensusError::UnknownPeer(vote.voter().to_hex()));
        }
        if !voters.insert(vote.voter()) {
            return Err(invalid(format!("duplicate voter {}", vote.voter().short())));
        }
    }

    verify_votes(votes)?;
    Ok(voters)
}

/// Verify a commit certificate received from another peer
pub fn verify_commit(
    commit: &CommitMessage,
    peers: &[Peer],
    model: ConsistencyModel,
) -> Result<(), ConsensusError> {
    if let Some(vote) = commit.votes.iter().find(|vote| vote.hash != commit.hash) {
        return Err(ConsensusError::InvalidCommit(format!(
            "vote for {} in commit of {}",
            vote.hash, commit.hash
        )));
    }

    let voters = verify_evidence(&commit.votes, peers, ConsensusError::InvalidCommit)?;

    let need = model.threshold(peers.len() as u64);
    let have = voters.len() as u64;
    if have < need {
        return Err(ConsensusError::InsufficientVotes { have, need });
    }
    Ok(())
}

/// Verify that a reject proof shows no block can still commit
pub fn verify_reject(
    reject: &RejectMessage,
    peers: &[Peer],
    model: ConsistencyModel,
) -> Result<(), ConsensusError> {
    let voters = verify_evidence(&reject.votes, peers, ConsensusError::InvalidReject)?;

    let mut per_block: BTreeMap<_, u64> = BTreeMap::new();
    for vote in &reject.votes {
        *per_block.entry(vote.hash.block_hash).or_default() += 1;
    }
    let best = per_block.values().copied().max().unwrap_or(0);

    let peers_in_round = peers.len() as u64;
    let remaining = peers_in_round.saturating_sub(voters.len() as u64);
    if model.can_reach(best, remaining, peers_in_round) {
        return Err(ConsensusError::InvalidReject(format!(
            "{} votes with {} peers silent can still reach {}",
            best,
            remaining,
            model.threshold(peers_in_round)
        )));
    }
    Ok(())
}
