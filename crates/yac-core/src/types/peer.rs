use serde::{Deserialize, Serialize};

use crate::crypto::PublicKey;

/// A consensus participant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    pub public_key: PublicKey,
    /// Base URL of the peer's RPC endpoint
    pub address: String,
}

impl Peer {
    pub fn new(public_key: PublicKey, address: impl Into<String>) -> Self {
        Peer {
            public_key,
            address: address.into(),
        }
    }
}
