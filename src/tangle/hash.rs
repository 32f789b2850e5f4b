//! Content-addressed hashing for tangle sites.
//!
//! This module provides the [`Hash`] type, a 32-byte SHA3-256 digest used as
//! the content address of every site and payload in the tangle. Besides
//! addressing, a hash carries the proof-of-work *weight* of a site: the
//! number of leading zero bits.

use crate::error::{Result, SnarlError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;

/// Size of a hash in bytes.
pub const HASH_SIZE: usize = 32;

/// A 32-byte SHA3-256 content hash.
///
/// The all-zero value is the distinguished empty hash used to denote
/// absence; see [`Hash::EMPTY`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// The distinguished all-zero hash.
    pub const EMPTY: Hash = Hash([0u8; HASH_SIZE]);

    /// Computes the hash of the given bytes.
    pub fn new(data: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Creates a hash from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Returns the proof-of-work weight: the count of leading zero bits.
    pub fn weight(&self) -> u32 {
        let mut weight = 0;
        for byte in self.0 {
            if byte == 0 {
                weight += 8;
            } else {
                weight += byte.leading_zeros();
                break;
            }
        }
        weight
    }

    /// Returns true if this is the all-zero empty hash.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Returns the printable form: URL-safe base64 without padding.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Parses a hash from its printable form.
    pub fn decode(s: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| SnarlError::decode(format!("invalid hash encoding: {}", e)))?;
        if bytes.len() != HASH_SIZE {
            return Err(SnarlError::decode(format!(
                "hash must be exactly {} bytes, got {}",
                HASH_SIZE,
                bytes.len()
            )));
        }
        let mut arr = [0u8; HASH_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Returns a short form for display (first 8 bytes as hex).
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}...)", self.short())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let a = Hash::new(b"test data");
        let b = Hash::new(b"test data");
        assert_eq!(a, b);

        let c = Hash::new(b"other data");
        assert_ne!(a, c);
    }

    #[test]
    fn test_weight_counts_leading_zero_bits() {
        let mut bytes = [0xffu8; HASH_SIZE];
        assert_eq!(Hash::from_bytes(bytes).weight(), 0);

        bytes[0] = 0x7f;
        assert_eq!(Hash::from_bytes(bytes).weight(), 1);

        bytes[0] = 0x01;
        assert_eq!(Hash::from_bytes(bytes).weight(), 7);

        bytes[0] = 0x00;
        bytes[1] = 0x80;
        assert_eq!(Hash::from_bytes(bytes).weight(), 8);

        bytes[1] = 0x20;
        assert_eq!(Hash::from_bytes(bytes).weight(), 10);
    }

    #[test]
    fn test_weight_of_empty_hash() {
        assert_eq!(Hash::EMPTY.weight(), (HASH_SIZE * 8) as u32);
    }

    #[test]
    fn test_empty_hash() {
        assert!(Hash::EMPTY.is_empty());
        assert!(!Hash::new(b"x").is_empty());
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let hash = Hash::new(b"roundtrip");
        let encoded = hash.encode();
        let decoded = Hash::decode(&encoded).unwrap();
        assert_eq!(hash, decoded);
    }

    #[test]
    fn test_encoding_is_url_safe_and_unpadded() {
        let hash = Hash::new(b"encoding");
        let encoded = hash.encode();
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(Hash::decode("not!valid!base64!").is_err());
        // Valid base64 but wrong length
        assert!(Hash::decode("AAAA").is_err());
    }

    #[test]
    fn test_display_matches_encode() {
        let hash = Hash::new(b"display");
        assert_eq!(format!("{}", hash), hash.encode());
    }
}
