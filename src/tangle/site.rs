//! Tangle sites: the immutable nodes of the DAG.
//!
//! A site exists in two representations:
//!
//! - [`Site`]: the in-memory node, holding `Arc` pointers to the parent
//!   sites it validates. Built once at load time and extended on append.
//! - [`StoredSite`]: the storage/wire record, holding parent *hashes* only.
//!   Re-linking hashes back into pointers is the engine's job.
//!
//! The site's identity hash is purely structural: it covers the content
//! hash, nonce, type tag and the parent hashes in order. The payload bytes
//! carried in `data` and the advisory `tip` flag never enter the hash.

use crate::error::{Result, SnarlError};
use crate::tangle::hash::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Payload kind tags. The string forms enter the structural hash and the
/// wire format, so their spellings are part of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteType {
    /// A signed textual post
    Post,
    /// An image payload
    Image,
    /// A published public key
    Key,
    /// A bootstrap sentinel site
    Genesis,
}

impl SiteType {
    /// Returns the wire tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteType::Post => "post",
            SiteType::Image => "image",
            SiteType::Key => "key",
            SiteType::Genesis => "genesis",
        }
    }

    /// Parses a wire tag.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "post" => Ok(SiteType::Post),
            "image" => Ok(SiteType::Image),
            "key" => Ok(SiteType::Key),
            "genesis" => Ok(SiteType::Genesis),
            other => Err(SnarlError::decode(format!("unknown site type: {}", other))),
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Computes the structural hash of a site from its logical fields.
///
/// Preimage: `"C" + hex(content) + "N" + decimal(nonce) + "T" + type +
/// ("V" + hex(parent))*`. The parent list order matters.
pub(crate) fn structural_hash<I>(content: &Hash, nonce: u64, site_type: SiteType, parents: I) -> Hash
where
    I: IntoIterator<Item = Hash>,
{
    let mut preimage = String::new();
    preimage.push('C');
    preimage.push_str(&hex::encode(content.as_bytes()));
    preimage.push('N');
    preimage.push_str(&nonce.to_string());
    preimage.push('T');
    preimage.push_str(site_type.as_str());
    for parent in parents {
        preimage.push('V');
        preimage.push_str(&hex::encode(parent.as_bytes()));
    }
    Hash::new(preimage.as_bytes())
}

/// An in-memory tangle site with resolved parent pointers.
///
/// Sites are mutable only while being assembled and mined; once submitted
/// to the engine they are frozen behind an `Arc` and never change.
#[derive(Clone)]
pub struct Site {
    content: Hash,
    site_type: SiteType,
    nonce: u64,
    validates: Vec<Arc<Site>>,
    data: Vec<u8>,
}

impl Site {
    /// Creates a new site referencing the given parents.
    pub fn new(content: Hash, site_type: SiteType, validates: Vec<Arc<Site>>) -> Self {
        Self {
            content,
            site_type,
            nonce: 0,
            validates,
            data: Vec::new(),
        }
    }

    /// Creates a bootstrap genesis site over a stable content marker.
    pub fn genesis(marker: &[u8]) -> Self {
        Self::new(Hash::new(marker), SiteType::Genesis, Vec::new())
    }

    /// Attaches payload bytes to carry alongside the site.
    ///
    /// The payload does not participate in the site hash.
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Returns the payload content hash.
    pub fn content(&self) -> &Hash {
        &self.content
    }

    /// Returns the payload kind.
    pub fn site_type(&self) -> SiteType {
        self.site_type
    }

    /// Returns the proof-of-work nonce.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Returns the validated parent sites, in order.
    pub fn validates(&self) -> &[Arc<Site>] {
        &self.validates
    }

    /// Returns the carried payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Computes the structural identity hash of this site.
    ///
    /// Parent hashes are obtained by calling each parent's own `hash`, so
    /// the result is independent of any storage representation.
    pub fn hash(&self) -> Hash {
        structural_hash(
            &self.content,
            self.nonce,
            self.site_type,
            self.validates.iter().map(|parent| parent.hash()),
        )
    }

    /// Mines the site: increments the nonce until the hash weight reaches
    /// `target`.
    ///
    /// CPU-bound; run it before submitting the site, never under the engine
    /// lock. The caller owns the loop via this call and can bound it by
    /// running it on its own thread.
    pub fn mine(&mut self, target: u32) {
        // The parent hashes are fixed while mining; precompute the parts of
        // the preimage that do not depend on the nonce.
        let mut prefix = String::new();
        prefix.push('C');
        prefix.push_str(&hex::encode(self.content.as_bytes()));
        prefix.push('N');

        let mut suffix = String::new();
        suffix.push('T');
        suffix.push_str(self.site_type.as_str());
        for parent in &self.validates {
            suffix.push('V');
            suffix.push_str(&hex::encode(parent.hash().as_bytes()));
        }

        loop {
            let preimage = format!("{}{}{}", prefix, self.nonce, suffix);
            if Hash::new(preimage.as_bytes()).weight() >= target {
                return;
            }
            self.nonce += 1;
        }
    }

    /// Rebuilds an in-memory site from a stored record and its resolved
    /// parent pointers.
    ///
    /// The caller must pass the parents matching `record.validates`, in
    /// order; the engine resolves them against its store when loading or
    /// receiving a site.
    pub(crate) fn from_stored(record: &StoredSite, validates: Vec<Arc<Site>>) -> Self {
        debug_assert_eq!(record.validates.len(), validates.len());
        Self {
            content: record.content,
            site_type: record.site_type,
            nonce: record.nonce,
            validates,
            data: record.data.clone(),
        }
    }

    /// Converts to the storage/wire record, flattening parents to hashes.
    pub fn to_stored(&self, tip: bool) -> StoredSite {
        StoredSite {
            validates: self.validates.iter().map(|parent| parent.hash()).collect(),
            nonce: self.nonce,
            content: self.content,
            site_type: self.site_type,
            data: self.data.clone(),
            tip,
        }
    }

    /// Serializes the site for storage or transport.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.to_stored(false).serialize()
    }
}

impl PartialEq for Site {
    /// Two sites are the same site exactly when their structural hashes
    /// agree.
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Site {}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("hash", &self.hash())
            .field("type", &self.site_type)
            .field("nonce", &self.nonce)
            .field("parents", &self.validates.len())
            .finish()
    }
}

/// The storage and wire form of a site.
///
/// Parents are recorded as hashes; `data` carries the serialized payload
/// (e.g. a post) and `tip` is advisory transport state. Neither enters the
/// structural hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSite {
    /// Hashes of the validated parent sites, in order
    pub validates: Vec<Hash>,
    /// Proof-of-work nonce
    pub nonce: u64,
    /// Payload content hash
    pub content: Hash,
    /// Payload kind
    pub site_type: SiteType,
    /// Serialized payload carried alongside for transport
    pub data: Vec<u8>,
    /// Whether the sender considered this site a tip
    pub tip: bool,
}

impl StoredSite {
    /// Computes the structural identity hash from the recorded fields.
    pub fn site_hash(&self) -> Hash {
        structural_hash(
            &self.content,
            self.nonce,
            self.site_type,
            self.validates.iter().copied(),
        )
    }

    /// Encodes the record with bincode.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SnarlError::serialization(format!("failed to serialize site: {}", e)))
    }

    /// Decodes a record from bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| SnarlError::decode(format!("failed to deserialize site: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(byte: u8) -> Hash {
        let mut bytes = [0u8; 32];
        bytes[0] = byte;
        Hash::from_bytes(bytes)
    }

    #[test]
    fn test_site_hash_deterministic() {
        let site = Site::new(content(1), SiteType::Post, vec![]);
        assert_eq!(site.hash(), site.hash());
    }

    #[test]
    fn test_site_hash_depends_on_fields() {
        let base = Site::new(content(1), SiteType::Post, vec![]);

        let other_content = Site::new(content(2), SiteType::Post, vec![]);
        assert_ne!(base.hash(), other_content.hash());

        let other_type = Site::new(content(1), SiteType::Image, vec![]);
        assert_ne!(base.hash(), other_type.hash());

        let mut other_nonce = Site::new(content(1), SiteType::Post, vec![]);
        other_nonce.nonce = 1;
        assert_ne!(base.hash(), other_nonce.hash());
    }

    #[test]
    fn test_site_hash_ignores_data() {
        let bare = Site::new(content(1), SiteType::Post, vec![]);
        let with_payload =
            Site::new(content(1), SiteType::Post, vec![]).with_data(b"payload".to_vec());
        assert_eq!(bare.hash(), with_payload.hash());
    }

    #[test]
    fn test_parent_order_matters() {
        let p1 = Arc::new(Site::genesis(b"P1"));
        let p2 = Arc::new(Site::genesis(b"P2"));

        let forward = Site::new(content(1), SiteType::Post, vec![p1.clone(), p2.clone()]);
        let reversed = Site::new(content(1), SiteType::Post, vec![p2, p1]);
        assert_ne!(forward.hash(), reversed.hash());
    }

    #[test]
    fn test_hash_is_recursive_over_parents() {
        let parent_a = Arc::new(Site::genesis(b"PARENT"));
        let mut modified = Site::genesis(b"PARENT");
        modified.nonce = 99;
        let parent_b = Arc::new(modified);

        let child_a = Site::new(content(1), SiteType::Post, vec![parent_a]);
        let child_b = Site::new(content(1), SiteType::Post, vec![parent_b]);
        assert_ne!(child_a.hash(), child_b.hash());
    }

    #[test]
    fn test_mine_reaches_target() {
        let mut site = Site::new(content(7), SiteType::Post, vec![]);
        site.mine(4);
        assert!(site.hash().weight() >= 4);
    }

    #[test]
    fn test_mine_noop_when_already_heavy() {
        let mut site = Site::new(content(7), SiteType::Post, vec![]);
        site.mine(4);
        let nonce = site.nonce();
        site.mine(1);
        assert_eq!(site.nonce(), nonce);
    }

    #[test]
    fn test_stored_roundtrip() {
        let p1 = Arc::new(Site::genesis(b"P1"));
        let p2 = Arc::new(Site::genesis(b"P2"));
        let site = Site::new(content(3), SiteType::Post, vec![p1, p2]).with_data(b"blob".to_vec());

        let stored = site.to_stored(true);
        let bytes = stored.serialize().unwrap();
        let restored = StoredSite::deserialize(&bytes).unwrap();

        assert_eq!(stored, restored);
        assert_eq!(restored.site_hash(), site.hash());
        assert_eq!(restored.validates.len(), 2);
        assert_eq!(restored.data, b"blob");
        assert!(restored.tip);
    }

    #[test]
    fn test_stored_hash_matches_site_hash() {
        let parent = Arc::new(Site::genesis(b"P"));
        let mut site = Site::new(content(5), SiteType::Post, vec![parent]);
        site.mine(1);
        assert_eq!(site.to_stored(false).site_hash(), site.hash());
    }

    #[test]
    fn test_genesis_site_shape() {
        let genesis = Site::genesis(b"GENESIS_1");
        assert_eq!(genesis.site_type(), SiteType::Genesis);
        assert_eq!(genesis.nonce(), 0);
        assert!(genesis.validates().is_empty());
        assert_eq!(*genesis.content(), Hash::new(b"GENESIS_1"));
    }

    #[test]
    fn test_site_type_tags() {
        for tag in ["post", "image", "key", "genesis"] {
            assert_eq!(SiteType::from_tag(tag).unwrap().as_str(), tag);
        }
        assert!(SiteType::from_tag("unknown").is_err());
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(StoredSite::deserialize(&[0xff; 4]).is_err());
    }
}
