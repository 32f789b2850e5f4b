//! Boundary adapter between the tangle and the peer transport.
//!
//! The transport itself (gRPC/HTTP framing, connection management) is an
//! external collaborator; this module only defines the wire shapes it
//! exchanges and the site codec it wraps:
//!
//! - `GetInfo(Info) -> Info`: status exchange between peers
//! - `AddSite(SiteMessage) -> Ack`: push a single site; the receiver
//!   resolves and appends it
//! - `Splice(stream SiteMessage) -> Ack`: bulk push for initial sync; the
//!   receiver reinitializes, then appends each streamed site in order

use crate::error::{Result, SnarlError};
use crate::tangle::hash::{Hash, HASH_SIZE};
use crate::tangle::site::{SiteType, StoredSite};
use crate::tangle::{Status, Tangle};
use serde::{Deserialize, Serialize};

/// Method name for the status exchange.
pub const METHOD_GET_INFO: &str = "tangle.get_info";
/// Method name for pushing a single site.
pub const METHOD_ADD_SITE: &str = "tangle.add_site";
/// Method name for the bulk sync stream.
pub const METHOD_SPLICE: &str = "tangle.splice";

/// Peer status exchange record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    /// Node software version
    pub version: String,
    /// Total stored sites
    pub size: usize,
    /// Interface the sender accepts peer connections on
    pub listen_interface: String,
    /// Peer addresses the sender is connected to
    pub peers: Vec<String>,
    /// A sampled set of encoded site hashes (the sender's current tips)
    pub sample: Vec<String>,
}

impl Info {
    /// Assembles an info record from an engine snapshot.
    pub fn for_tangle(
        version: impl Into<String>,
        listen_interface: impl Into<String>,
        peers: Vec<String>,
        tangle: &Tangle,
    ) -> Self {
        let Status {
            size, tip_hashes, ..
        } = tangle.status();
        Self {
            version: version.into(),
            size,
            listen_interface: listen_interface.into(),
            peers,
            sample: tip_hashes,
        }
    }
}

/// Empty acknowledgement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {}

/// The site wire message.
///
/// Mirrors the stored record with raw byte fields so the transport does
/// not depend on internal types: parent hashes and the content hash travel
/// as plain byte strings, the type as its tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMessage {
    /// Hashes of the validated parent sites, in order
    pub validates: Vec<Vec<u8>>,
    /// Proof-of-work nonce
    pub nonce: u64,
    /// Payload content hash
    pub content: Vec<u8>,
    /// Payload kind tag
    pub site_type: String,
    /// Serialized payload carried alongside
    pub data: Vec<u8>,
    /// Whether the sender considered this site a tip
    pub tip: bool,
}

impl From<&StoredSite> for SiteMessage {
    fn from(site: &StoredSite) -> Self {
        Self {
            validates: site
                .validates
                .iter()
                .map(|hash| hash.as_bytes().to_vec())
                .collect(),
            nonce: site.nonce,
            content: site.content.as_bytes().to_vec(),
            site_type: site.site_type.as_str().to_string(),
            data: site.data.clone(),
            tip: site.tip,
        }
    }
}

impl TryFrom<SiteMessage> for StoredSite {
    type Error = SnarlError;

    fn try_from(message: SiteMessage) -> Result<Self> {
        let validates = message
            .validates
            .iter()
            .map(|bytes| hash_from_wire(bytes))
            .collect::<Result<Vec<_>>>()?;
        Ok(StoredSite {
            validates,
            nonce: message.nonce,
            content: hash_from_wire(&message.content)?,
            site_type: SiteType::from_tag(&message.site_type)?,
            data: message.data,
            tip: message.tip,
        })
    }
}

fn hash_from_wire(bytes: &[u8]) -> Result<Hash> {
    if bytes.len() != HASH_SIZE {
        return Err(SnarlError::decode(format!(
            "wire hash must be {} bytes, got {}",
            HASH_SIZE,
            bytes.len()
        )));
    }
    let mut arr = [0u8; HASH_SIZE];
    arr.copy_from_slice(bytes);
    Ok(Hash::from_bytes(arr))
}

/// Serializes a site record for the transport.
pub fn encode_site(site: &StoredSite) -> Result<Vec<u8>> {
    site.serialize()
}

/// Deserializes a site record received from the transport.
///
/// The result still references parents by hash; pass it through
/// [`Tangle::resolve`] before appending.
pub fn decode_site(bytes: &[u8]) -> Result<StoredSite> {
    StoredSite::deserialize(bytes)
}
