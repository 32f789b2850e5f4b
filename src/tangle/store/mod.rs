//! The pluggable persistent store behind the tangle.
//!
//! The engine is polymorphic over this capability set so backends can be
//! swapped: [`MemoryStore`] for tests, [`DiskStore`] (RocksDB) for
//! production. Both index site bodies by structural hash and keep a durable
//! tip index alongside, so a restart does not require recomputing the tip
//! set from a full scan.

use crate::error::Result;
use crate::tangle::hash::Hash;
use crate::tangle::site::StoredSite;

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Store contract consumed by the tangle engine.
///
/// Implementations must uphold:
///
/// - `put` keys the body by the site's structural hash and rejects a key
///   already present with different bytes; re-putting identical bytes is a
///   no-op.
/// - `get` re-derives the structural hash of the retrieved record; on
///   mismatch it logs and reports the site as absent rather than returning
///   corrupt data.
/// - `set_tip` updates the tip index only; site bodies never change.
pub trait SiteStore: Send {
    /// Persists a site body under its structural hash.
    fn put(&mut self, site: &StoredSite) -> Result<()>;

    /// Retrieves a site by hash, verifying the body against the key.
    fn get(&self, hash: &Hash) -> Result<Option<StoredSite>>;

    /// Removes a site body and its tip flag. Used only by reinitialize.
    fn delete(&mut self, hash: &Hash) -> Result<()>;

    /// Returns the hashes of all stored sites, in unspecified order.
    fn keys(&self) -> Result<Vec<Hash>>;

    /// Returns the persisted tip set.
    fn tips(&self) -> Result<Vec<StoredSite>>;

    /// Flags or unflags a site in the tip index.
    fn set_tip(&mut self, hash: &Hash, tip: bool) -> Result<()>;

    /// Flushes and releases backend resources.
    fn close(&mut self) -> Result<()>;
}
