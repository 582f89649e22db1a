use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte Blake3 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn new(data: [u8; 32]) -> Self {
        Hash(data)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 32] = slice.try_into().ok()?;
        Some(Hash(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes).ok_or(hex::FromHexError::InvalidStringLength)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First four bytes in hex, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Compute Blake3 hash of data
pub fn hash_blake3(data: &[u8]) -> Hash {
    Hash(*blake3::hash(data).as_bytes())
}

/// Merkle root over a list of leaf hashes.
///
/// An odd node at any level is paired with itself. The empty list maps to
/// `Hash::ZERO`.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    let mut level: Vec<Hash> = match leaves {
        [] => return Hash::ZERO,
        [single] => return *single,
        _ => leaves.to_vec(),
    };

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                let mut hasher = blake3::Hasher::new();
                hasher.update(&pair[0].0);
                hasher.update(&right.0);
                Hash(*hasher.finalize().as_bytes())
            })
            .collect();
    }

    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_blake3(b"proposal"), hash_blake3(b"proposal"));
        assert_ne!(hash_blake3(b"proposal"), hash_blake3(b"block"));
    }

    #[test]
    fn test_merkle_root_edges() {
        assert_eq!(merkle_root(&[]), Hash::ZERO);

        let leaf = hash_blake3(b"single");
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn test_merkle_root_is_order_sensitive() {
        let a = hash_blake3(b"a");
        let b = hash_blake3(b"b");
        let c = hash_blake3(b"c");

        assert_ne!(merkle_root(&[a, b, c]), merkle_root(&[b, a, c]));
        assert_ne!(merkle_root(&[a, b, c]), Hash::ZERO);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let hash = hash_blake3(b"test");
        assert_eq!(Hash::from_hex(&hash.to_hex()).unwrap(), hash);
        assert!(Hash::from_hex("abcd").is_err());
        assert_eq!(hash.short().len(), 8);
    }
}
