use serde::{Deserialize, Serialize};

use crate::crypto::{hash_blake3, sign, verify, Hash, PublicKey, SecretKey, Sig};
use crate::error::CoreError;
use crate::serialize;

/// An opaque, creator-signed transaction. Its commands are interpreted by
/// the ledger, not by consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub creator: PublicKey,
    pub nonce: u64,
    pub payload: Vec<u8>,
    pub signature: Sig,
}

#[derive(Serialize)]
struct TransactionBody<'a> {
    creator: &'a PublicKey,
    nonce: u64,
    payload: &'a [u8],
}

impl Transaction {
    pub fn new_signed(
        creator: PublicKey,
        nonce: u64,
        payload: Vec<u8>,
        secret_key: &SecretKey,
    ) -> Result<Self, CoreError> {
        let mut tx = Transaction {
            creator,
            nonce,
            payload,
            signature: Sig::default(),
        };
        tx.signature = sign(secret_key, &tx.body_bytes()?);
        Ok(tx)
    }

    fn body_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serialize::to_bytes(&TransactionBody {
            creator: &self.creator,
            nonce: self.nonce,
            payload: &self.payload,
        })
    }

    /// Hash over the signed body
    pub fn hash(&self) -> Result<Hash, CoreError> {
        Ok(hash_blake3(&self.body_bytes()?))
    }

    pub fn verify_signature(&self) -> Result<(), CoreError> {
        verify(&self.creator, &self.body_bytes()?, &self.signature)
    }
}
