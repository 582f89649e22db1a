//! Yac Core - Core types, cryptography, and serialization
//!
//! This crate provides the value types shared by the YAC voting engine,
//! the ledger and the node: hashes, peer keys, signed votes, proposals
//! and candidate blocks.

pub mod crypto;
pub mod error;
pub mod serialize;
pub mod types;

pub use crypto::{
    hash_blake3, merkle_root, sign, verify, verify_signature, Hash, KeyPair, PublicKey,
    SecretKey, Sig,
};
pub use error::CoreError;
pub use types::*;
