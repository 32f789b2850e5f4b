//! Signing key generation and management.
//!
//! Only ML-DSA-65 signing keys exist in this system; posts are signed, never
//! encrypted. Key IDs are derived deterministically from the key material.

use crate::crypto::{generate_key_id, hash_data, unix_timestamp, Algorithm, KeyMetadata};
use crate::error::{Result, SnarlError};
use pqcrypto_mldsa::mldsa65::{self, PublicKey as MldsaPublicKey, SecretKey as MldsaSecretKey};
use pqcrypto_traits::sign::{PublicKey as SignPublicKey, SecretKey as SignSecretKey};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A public signing key.
#[derive(Clone, Serialize, Deserialize)]
pub struct PublicKey {
    /// Serialized key bytes for the specific algorithm
    pub(crate) key_bytes: Vec<u8>,
    /// Key metadata including algorithm, identity and creation time
    pub(crate) metadata: KeyMetadata,
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.metadata.algorithm)
            .field("key_id", &format!("{:016X}", self.metadata.key_id))
            .field("key_size", &self.key_bytes.len())
            .finish()
    }
}

impl PublicKey {
    /// Creates a new ML-DSA-65 public key with the given identity.
    pub fn new_mldsa65(key: MldsaPublicKey, key_id: u64) -> Self {
        Self {
            key_bytes: SignPublicKey::as_bytes(&key).to_vec(),
            metadata: KeyMetadata::new(Algorithm::Mldsa65, key_id),
        }
    }

    /// Returns the key's metadata.
    pub fn metadata(&self) -> &KeyMetadata {
        &self.metadata
    }

    /// Returns the key's unique identifier.
    pub fn key_id(&self) -> u64 {
        self.metadata.key_id
    }

    /// Returns the key ID in its canonical printable form (16 hex digits).
    pub fn key_id_string(&self) -> String {
        format!("{:016X}", self.metadata.key_id)
    }

    /// Returns the algorithm used by this key.
    pub fn algorithm(&self) -> Algorithm {
        self.metadata.algorithm
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    /// Computes the SHA3-256 fingerprint of this key.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut data = Vec::with_capacity(1 + self.key_bytes.len());
        data.extend_from_slice(&(self.metadata.algorithm as u8).to_be_bytes());
        data.extend_from_slice(&self.key_bytes);
        hash_data(&data)
    }

    /// Reconstructs the ML-DSA-65 public key for verification.
    pub fn as_mldsa65(&self) -> Result<MldsaPublicKey> {
        if self.metadata.algorithm != Algorithm::Mldsa65 {
            return Err(SnarlError::key("key is not an ML-DSA-65 key"));
        }
        MldsaPublicKey::from_bytes(&self.key_bytes)
            .map_err(|_| SnarlError::key("failed to reconstruct ML-DSA-65 public key from bytes"))
    }
}

/// A private signing key.
#[derive(Clone, Serialize, Deserialize)]
pub struct PrivateKey {
    /// Serialized secret key bytes
    pub(crate) key_bytes: Vec<u8>,
    /// Key metadata including algorithm, identity and creation time
    pub(crate) metadata: KeyMetadata,
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.metadata.algorithm)
            .field("key_id", &format!("{:016X}", self.metadata.key_id))
            .finish()
    }
}

impl PrivateKey {
    /// Creates a new ML-DSA-65 private key with the given identity.
    pub fn new_mldsa65(key: MldsaSecretKey, key_id: u64) -> Self {
        Self {
            key_bytes: SignSecretKey::as_bytes(&key).to_vec(),
            metadata: KeyMetadata::new(Algorithm::Mldsa65, key_id),
        }
    }

    /// Returns the key's metadata.
    pub fn metadata(&self) -> &KeyMetadata {
        &self.metadata
    }

    /// Returns the key's unique identifier.
    pub fn key_id(&self) -> u64 {
        self.metadata.key_id
    }

    /// Returns the algorithm used by this key.
    pub fn algorithm(&self) -> Algorithm {
        self.metadata.algorithm
    }

    /// Reconstructs the ML-DSA-65 secret key for signing.
    pub fn as_mldsa65(&self) -> Result<MldsaSecretKey> {
        if self.metadata.algorithm != Algorithm::Mldsa65 {
            return Err(SnarlError::key("key is not an ML-DSA-65 key"));
        }
        MldsaSecretKey::from_bytes(&self.key_bytes)
            .map_err(|_| SnarlError::key("failed to reconstruct ML-DSA-65 secret key from bytes"))
    }
}

/// A complete signing key pair.
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyPair {
    /// The public key component
    pub public: PublicKey,
    /// The private key component
    pub private: PrivateKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.public.metadata.algorithm)
            .field("key_id", &format!("{:016X}", self.public.metadata.key_id))
            .finish()
    }
}

impl KeyPair {
    /// Generates a new ML-DSA-65 signing key pair.
    ///
    /// The `rng` parameter is currently unused: the pqcrypto-mldsa crate
    /// draws from its own internal CSPRNG during key generation.
    pub fn generate_mldsa65<R: CryptoRng + RngCore>(_rng: &mut R) -> Result<Self> {
        let (public_key, secret_key) = mldsa65::keypair();

        let now = unix_timestamp();
        let key_material = SignPublicKey::as_bytes(&public_key);
        let key_id = generate_key_id(key_material, Algorithm::Mldsa65, now);

        Ok(Self {
            public: PublicKey::new_mldsa65(public_key, key_id),
            private: PrivateKey::new_mldsa65(secret_key, key_id),
        })
    }

    /// Returns the public key component.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Returns the private key component.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Returns the key pair's unique identifier.
    pub fn key_id(&self) -> u64 {
        self.public.key_id()
    }

    /// Checks that the public and private halves belong together.
    pub fn is_valid(&self) -> bool {
        self.public.key_id() == self.private.key_id()
            && self.public.algorithm() == self.private.algorithm()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, ID: {})", self.algorithm(), self.key_id_string())
    }
}
