use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Encode to deterministic bincode bytes. Used for everything that gets
/// hashed or signed.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    bincode::serialize(value).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Decode from bincode bytes
pub fn from_bytes<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, CoreError> {
    bincode::deserialize(bytes).map_err(|e| CoreError::Deserialization(e.to_string()))
}

/// Encode to a JSON string (RPC and config files)
pub fn to_json<T: Serialize>(value: &T) -> Result<String, CoreError> {
    serde_json::to_string(value).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Decode from a JSON string
pub fn from_json<'a, T: Deserialize<'a>>(json: &'a str) -> Result<T, CoreError> {
    serde_json::from_str(json).map_err(|e| CoreError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockHash, ProposalHash, Round, YacHash};
    use crate::crypto::hash_blake3;

    #[test]
    fn test_signing_payload_is_deterministic() {
        let hash = YacHash::new(
            ProposalHash(hash_blake3(b"proposal")),
            BlockHash(hash_blake3(b"block")),
        );
        let round = Round::new(7, 1);

        let bytes1 = to_bytes(&(round, hash)).unwrap();
        let bytes2 = to_bytes(&(round, hash)).unwrap();
        assert_eq!(bytes1, bytes2);
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let round = Round::new(3, 0);
        let bytes = to_bytes(&round).unwrap();

        let result: Result<Round, _> = from_bytes(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(CoreError::Deserialization(_))));
    }

    #[test]
    fn test_json_decode_error() {
        let result: Result<Round, _> = from_json("{\"height\": \"nope\"}");
        assert!(result.is_err());
    }
}
