//! Signed post records.
//!
//! A post binds UTF-8 text to an author: the text is signed with the
//! author's key, and the post's canonical hash ties content, timestamp,
//! key identity and signature together. Sites of type `post` carry a
//! post's canonical hash as their `content` and the encoded post as their
//! payload bytes.
//!
//! Signatures cover the *whitespace-trimmed* content so that transports
//! that add or strip trailing newlines cannot invalidate a post. The
//! canonical hash, in contrast, covers the content verbatim.

use crate::armor::{self, ArmorType};
use crate::crypto::{sign_message, verify_signature, KeyPair, PublicKey, Signature};
use crate::error::{Result, SnarlError};
use crate::tangle::hash::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whitespace stripped from the content ends before signing/verification:
/// ASCII space, tab, LF, VT, FF, CR, plus NEL (U+0085) and NBSP (U+00A0).
const CONTENT_TRIM_SET: [char; 8] = [
    ' ', '\t', '\n', '\u{000B}', '\u{000C}', '\r', '\u{0085}', '\u{00A0}',
];

/// A signed post with its in-memory key material.
#[derive(Clone)]
pub struct Post {
    /// The post text, verbatim as published
    pub content: String,
    /// The author's public key
    pub pubkey: PublicKey,
    /// Detached signature over the trimmed content
    pub signature: Signature,
    /// Publication time, seconds since Unix epoch
    pub timestamp: i64,
}

impl fmt::Debug for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Post")
            .field("content_len", &self.content.len())
            .field("key_id", &self.pubkey.key_id_string())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// The transport form of a post: key and signature as ASCII-armored
/// strings. Field names match the JSON surface of the management boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostTransport {
    /// The post text
    pub content: String,
    /// Armored public key block
    pub pubkey: String,
    /// Armored detached signature block
    pub signature: String,
    /// Publication time, seconds since Unix epoch
    pub date: i64,
}

impl Post {
    /// Creates and signs a new post with the current time.
    pub fn create(content: impl Into<String>, keypair: &KeyPair) -> Result<Self> {
        let content = content.into();
        let signature = sign_message(keypair.private_key(), trimmed(&content).as_bytes())?;
        Ok(Self {
            content,
            pubkey: keypair.public_key().clone(),
            signature,
            timestamp: crate::crypto::unix_timestamp() as i64,
        })
    }

    /// Verifies the detached signature over the trimmed content.
    ///
    /// Any key reconstruction failure, digest mismatch or signature
    /// rejection yields an error.
    pub fn verify(&self) -> Result<()> {
        verify_signature(
            &self.pubkey,
            trimmed(&self.content).as_bytes(),
            &self.signature,
        )
    }

    /// Computes the canonical post hash.
    ///
    /// Preimage: `"C" + content + "D" + decimal(timestamp) + "P" + key id +
    /// "S" + hex(hash(signature bytes))`. The content enters verbatim.
    pub fn hash(&self) -> Hash {
        let sig_hash = Hash::new(self.signature.signature_bytes());
        let mut preimage = String::new();
        preimage.push('C');
        preimage.push_str(&self.content);
        preimage.push('D');
        preimage.push_str(&self.timestamp.to_string());
        preimage.push('P');
        preimage.push_str(&self.pubkey.key_id_string());
        preimage.push('S');
        preimage.push_str(&hex::encode(sig_hash.as_bytes()));
        Hash::new(preimage.as_bytes())
    }

    /// Builds the transport record, armoring the key and signature.
    pub fn transport_record(&self) -> Result<PostTransport> {
        let key_bytes = bincode::serialize(&self.pubkey)
            .map_err(|e| SnarlError::serialization(format!("failed to encode public key: {}", e)))?;
        let sig_bytes = bincode::serialize(&self.signature)
            .map_err(|e| SnarlError::serialization(format!("failed to encode signature: {}", e)))?;

        Ok(PostTransport {
            content: self.content.clone(),
            pubkey: armor::encode_public_key(&key_bytes),
            signature: armor::encode_signature(&sig_bytes),
            date: self.timestamp,
        })
    }

    /// Encodes the post for storage or transport.
    pub fn to_transport(&self) -> Result<Vec<u8>> {
        let record = self.transport_record()?;
        bincode::serialize(&record)
            .map_err(|e| SnarlError::serialization(format!("failed to encode post: {}", e)))
    }

    /// Restores a post from a transport record, re-parsing the armored
    /// blocks into key and signature objects.
    pub fn from_transport_record(record: PostTransport) -> Result<Self> {
        let key_block = armor::decode(&record.pubkey)?;
        if key_block.armor_type != ArmorType::PublicKey {
            return Err(SnarlError::decode("armored block is not a public key"));
        }
        let pubkey: PublicKey = bincode::deserialize(&key_block.data)
            .map_err(|e| SnarlError::decode(format!("invalid public key packet: {}", e)))?;

        let sig_block = armor::decode(&record.signature)?;
        if sig_block.armor_type != ArmorType::Signature {
            return Err(SnarlError::decode("armored block is not a signature"));
        }
        let signature: Signature = bincode::deserialize(&sig_block.data)
            .map_err(|e| SnarlError::decode(format!("invalid signature packet: {}", e)))?;

        Ok(Self {
            content: record.content,
            pubkey,
            signature,
            timestamp: record.date,
        })
    }

    /// Decodes a post from transport bytes.
    pub fn from_transport(bytes: &[u8]) -> Result<Self> {
        let record: PostTransport = bincode::deserialize(bytes)
            .map_err(|e| SnarlError::decode(format!("failed to decode post: {}", e)))?;
        Self::from_transport_record(record)
    }
}

/// Strips the content trim set from both ends.
fn trimmed(content: &str) -> &str {
    content.trim_matches(|c| CONTENT_TRIM_SET.contains(&c))
}
