//! Detached digital signatures.
//!
//! Signing hashes the message with the signature's declared digest
//! algorithm (SHA3-256) and signs the digest with ML-DSA-65. Verification
//! recomputes the digest with the declared algorithm and checks it against
//! the detached signature.

use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::{hash_data, unix_timestamp, Algorithm};
use crate::error::{Result, SnarlError};
use pqcrypto_mldsa::mldsa65;
use pqcrypto_traits::sign::DetachedSignature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A detached signature over a message digest.
#[derive(Clone, Serialize, Deserialize)]
pub struct Signature {
    /// The signature algorithm used
    pub algorithm: Algorithm,
    /// The digest algorithm applied to the message before signing
    pub hash_algorithm: Algorithm,
    /// The key ID that created this signature
    pub key_id: u64,
    /// The raw signature bytes
    pub signature_bytes: Vec<u8>,
    /// Signature creation time (Unix timestamp, seconds)
    pub created: u64,
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("algorithm", &self.algorithm)
            .field("hash_algorithm", &self.hash_algorithm)
            .field("key_id", &format!("{:016X}", self.key_id))
            .field("signature_size", &self.signature_bytes.len())
            .finish()
    }
}

impl Signature {
    /// Returns the signature algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the key ID that created this signature.
    pub fn key_id(&self) -> u64 {
        self.key_id
    }

    /// Returns the raw signature bytes.
    pub fn signature_bytes(&self) -> &[u8] {
        &self.signature_bytes
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signature({}, Key: {:016X}, {} bytes)",
            self.algorithm,
            self.key_id,
            self.signature_bytes.len()
        )
    }
}

/// Signs a message with the given private key.
///
/// The message is first digested with SHA3-256, then the digest is signed
/// with ML-DSA-65.
pub fn sign_message(private_key: &PrivateKey, message: &[u8]) -> Result<Signature> {
    if private_key.algorithm() != Algorithm::Mldsa65 {
        return Err(SnarlError::signature(
            "only ML-DSA-65 signatures are supported",
        ));
    }

    let secret_key = private_key.as_mldsa65()?;
    let digest = hash_data(message);
    let signature_bytes = mldsa65::detached_sign(&digest, &secret_key);

    Ok(Signature {
        algorithm: Algorithm::Mldsa65,
        hash_algorithm: Algorithm::Sha3_256,
        key_id: private_key.key_id(),
        signature_bytes: signature_bytes.as_bytes().to_vec(),
        created: unix_timestamp(),
    })
}

/// Verifies a detached signature against a message and public key.
///
/// Returns `Ok(())` when the signature is valid; any mismatch in key,
/// algorithm or digest yields an error.
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<()> {
    if public_key.algorithm() != signature.algorithm() {
        return Err(SnarlError::verify(
            "key algorithm does not match signature algorithm",
        ));
    }
    if public_key.key_id() != signature.key_id() {
        return Err(SnarlError::verify(
            "key ID does not match signature key ID",
        ));
    }
    if signature.hash_algorithm != Algorithm::Sha3_256 {
        return Err(SnarlError::verify(format!(
            "unsupported digest algorithm {}",
            signature.hash_algorithm
        )));
    }

    let verify_key = public_key.as_mldsa65()?;
    let detached = mldsa65::DetachedSignature::from_bytes(&signature.signature_bytes)
        .map_err(|_| SnarlError::verify("failed to reconstruct ML-DSA-65 signature"))?;

    let digest = hash_data(message);
    mldsa65::verify_detached_signature(&detached, &digest, &verify_key)
        .map_err(|_| SnarlError::verify("signature rejected"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use rand::rngs::OsRng;

    #[test]
    fn test_sign_and_verify() {
        let mut rng = OsRng;
        let keypair = KeyPair::generate_mldsa65(&mut rng).unwrap();

        let message = b"a signed publication";
        let signature = sign_message(keypair.private_key(), message).unwrap();

        assert_eq!(signature.algorithm(), Algorithm::Mldsa65);
        assert_eq!(signature.key_id(), keypair.key_id());
        verify_signature(keypair.public_key(), message, &signature).unwrap();
    }

    #[test]
    fn test_verify_rejects_wrong_message() {
        let mut rng = OsRng;
        let keypair = KeyPair::generate_mldsa65(&mut rng).unwrap();

        let signature = sign_message(keypair.private_key(), b"original").unwrap();
        assert!(verify_signature(keypair.public_key(), b"tampered", &signature).is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let mut rng = OsRng;
        let signer = KeyPair::generate_mldsa65(&mut rng).unwrap();
        let other = KeyPair::generate_mldsa65(&mut rng).unwrap();

        let signature = sign_message(signer.private_key(), b"message").unwrap();
        assert!(verify_signature(other.public_key(), b"message", &signature).is_err());
    }

    #[test]
    fn test_verify_rejects_unknown_digest() {
        let mut rng = OsRng;
        let keypair = KeyPair::generate_mldsa65(&mut rng).unwrap();

        let mut signature = sign_message(keypair.private_key(), b"message").unwrap();
        signature.hash_algorithm = Algorithm::Mldsa65;
        assert!(verify_signature(keypair.public_key(), b"message", &signature).is_err());
    }

    #[test]
    fn test_signature_serialization_roundtrip() {
        let mut rng = OsRng;
        let keypair = KeyPair::generate_mldsa65(&mut rng).unwrap();

        let signature = sign_message(keypair.private_key(), b"message").unwrap();
        let bytes = bincode::serialize(&signature).unwrap();
        let restored: Signature = bincode::deserialize(&bytes).unwrap();

        verify_signature(keypair.public_key(), b"message", &restored).unwrap();
    }
}
