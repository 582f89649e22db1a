use tracing::{debug, info};
use yac_core::{Block, BlockHash, KeyPair, Peer, Proposal, PublicKey, Round, VoteMessage, YacHash};

use crate::block_builder::BlockBuilder;
use crate::error::ConsensusError;

/// Leader of a round: peers rotate by height and by reject round, so a
/// rejected round is re-proposed by the next peer
pub fn leader_for<'a>(round: &Round, peers: &'a [Peer]) -> Option<&'a Peer> {
    if peers.is_empty() {
        return None;
    }
    let offset = round.height.wrapping_add(round.reject_round as u64);
    let index = (offset % peers.len() as u64) as usize;
    peers.get(index)
}

/// Signs votes with the peer key
#[derive(Debug, Clone)]
pub struct VoteSigner {
    keypair: KeyPair,
}

impl VoteSigner {
    pub fn new(keypair: KeyPair) -> Self {
        VoteSigner { keypair }
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public
    }

    pub fn sign(&self, round: Round, hash: YacHash) -> Result<VoteMessage, ConsensusError> {
        Ok(VoteMessage::new_signed(round, hash, &self.keypair)?)
    }
}

/// A voting peer: checks proposals, builds their blocks and votes for them
#[derive(Debug, Clone)]
pub struct Validator {
    signer: VoteSigner,
    block_builder: BlockBuilder,
}

impl Validator {
    pub fn new(keypair: KeyPair, block_builder: BlockBuilder) -> Self {
        Validator {
            signer: VoteSigner::new(keypair),
            block_builder,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.signer.public_key()
    }

    pub fn signer(&self) -> &VoteSigner {
        &self.signer
    }

    pub fn block_builder(&self) -> &BlockBuilder {
        &self.block_builder
    }

    /// Build the candidate block of `proposal` on the current head and sign
    /// a vote for it
    pub fn vote_on_proposal(
        &self,
        round: Round,
        proposal: &Proposal,
        top_height: u64,
        top_hash: BlockHash,
    ) -> Result<(Block, VoteMessage), ConsensusError> {
        if proposal.height != round.height {
            return Err(ConsensusError::InvalidProposal(format!(
                "proposal for height {} sent in round {}",
                proposal.height, round
            )));
        }
        let expected = top_height + 1;
        if round.height != expected {
            return Err(ConsensusError::HeightMismatch {
                expected,
                got: round.height,
            });
        }

        let block = self.block_builder.build(proposal, top_hash)?;
        let hash = YacHash::new(block.header.proposal_hash, block.hash()?);
        let vote = self.signer.sign(round, hash)?;

        info!("Voting for {} in round {}", hash, round);
        Ok((block, vote))
    }

    /// Check if this peer leads `round`
    pub fn is_leader(&self, round: &Round, peers: &[Peer]) -> bool {
        let leader = leader_for(round, peers).map(|peer| peer.public_key);
        debug!("Leader of round {}: {:?}", round, leader);
        leader == Some(self.public_key())
    }
}
