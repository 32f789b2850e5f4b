//! Cryptographic primitives for signed posts.
//!
//! Posts are authenticated with detached ML-DSA-65 signatures (NIST FIPS
//! 204) over a SHA3-256 digest of the signed text. Keys and signatures are
//! carried over the wire as ASCII-armored blocks, see [`crate::armor`].

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod keys;
pub mod signature;

pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use signature::{sign_message, verify_signature, Signature};

/// Supported algorithm identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// ML-DSA-65 for digital signatures (NIST standardized)
    Mldsa65 = 101,
    /// SHA3-256 for message digests
    Sha3_256 = 103,
}

impl Algorithm {
    /// Returns the algorithm name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Mldsa65 => "ML-DSA-65",
            Algorithm::Sha3_256 => "SHA3-256",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Computes the SHA3-256 digest of the given data.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derives a deterministic 64-bit key ID from key material.
///
/// Key IDs are derived from the key fingerprint rather than randomly
/// generated, following PGP practice: the last 8 bytes of a SHA3-256 digest
/// over algorithm, creation time and key material.
pub fn generate_key_id(key_material: &[u8], algorithm: Algorithm, created: u64) -> u64 {
    let mut hasher = Sha3_256::new();
    hasher.update((algorithm as u8).to_be_bytes());
    hasher.update(created.to_be_bytes());
    hasher.update(key_material);
    let digest = hasher.finalize();

    let mut key_id_bytes = [0u8; 8];
    key_id_bytes.copy_from_slice(&digest[24..32]);
    u64::from_be_bytes(key_id_bytes)
}

/// Returns the current Unix timestamp in seconds.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Key metadata: algorithm, identity and creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMetadata {
    /// Key creation time (Unix timestamp, seconds)
    pub created: u64,
    /// Key algorithm
    pub algorithm: Algorithm,
    /// Unique key identifier derived from the key material
    pub key_id: u64,
}

impl KeyMetadata {
    /// Creates new key metadata stamped with the current time.
    pub fn new(algorithm: Algorithm, key_id: u64) -> Self {
        Self {
            created: unix_timestamp(),
            algorithm,
            key_id,
        }
    }
}
