use serde::{Deserialize, Serialize};

use crate::crypto::{sign, verify, KeyPair, PublicKey, Sig};
use crate::error::CoreError;
use crate::serialize;
use crate::types::round::Round;
use crate::types::yac_hash::YacHash;

/// Signer identity and signature bytes of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSignature {
    pub public_key: PublicKey,
    pub signature: Sig,
}

/// One peer's signed endorsement of one [`YacHash`] in one [`Round`].
///
/// The voter identity is the signer's public key; a vote is immutable once
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMessage {
    pub round: Round,
    pub hash: YacHash,
    pub signature: VoteSignature,
}

impl VoteMessage {
    /// Bytes covered by the signature: the encoded `(round, hash)` pair
    pub fn signing_payload(round: &Round, hash: &YacHash) -> Result<Vec<u8>, CoreError> {
        serialize::to_bytes(&(round, hash))
    }

    /// Create a vote signed by `keypair`
    pub fn new_signed(round: Round, hash: YacHash, keypair: &KeyPair) -> Result<Self, CoreError> {
        let payload = Self::signing_payload(&round, &hash)?;
        Ok(VoteMessage {
            round,
            hash,
            signature: VoteSignature {
                public_key: keypair.public,
                signature: sign(&keypair.secret, &payload),
            },
        })
    }

    pub fn voter(&self) -> &PublicKey {
        &self.signature.public_key
    }

    /// Check the signature against the carried round and hash
    pub fn verify(&self) -> Result<(), CoreError> {
        let payload = Self::signing_payload(&self.round, &self.hash)?;
        verify(
            &self.signature.public_key,
            &payload,
            &self.signature.signature,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash_blake3;
    use crate::types::yac_hash::{BlockHash, ProposalHash};

    fn yac_hash(tag: &[u8]) -> YacHash {
        YacHash::new(
            ProposalHash(hash_blake3(b"proposal")),
            BlockHash(hash_blake3(tag)),
        )
    }

    #[test]
    fn test_signed_vote_verifies() {
        let peer = KeyPair::from_seed(1);
        let vote = VoteMessage::new_signed(Round::new(1, 0), yac_hash(b"a"), &peer).unwrap();

        assert_eq!(vote.voter(), &peer.public);
        assert!(vote.verify().is_ok());
    }

    #[test]
    fn test_vote_cannot_be_moved_to_another_round() {
        let peer = KeyPair::from_seed(1);
        let mut vote = VoteMessage::new_signed(Round::new(1, 0), yac_hash(b"a"), &peer).unwrap();

        vote.round = Round::new(1, 1);
        assert!(matches!(vote.verify(), Err(CoreError::InvalidSignature)));
    }

    #[test]
    fn test_vote_cannot_be_moved_to_another_block() {
        let peer = KeyPair::from_seed(1);
        let mut vote = VoteMessage::new_signed(Round::new(1, 0), yac_hash(b"a"), &peer).unwrap();

        vote.hash = yac_hash(b"b");
        assert!(vote.verify().is_err());
    }
}
