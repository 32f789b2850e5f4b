//! RocksDB-backed store for production use.
//!
//! Layout: two column families.
//!
//! - `"sites"`: key = 32-byte structural hash, value = bincode site body
//! - `"tips"`:  key = 32-byte structural hash, value = 1-byte flag
//!
//! The column family names are part of the on-disk format.

use crate::error::{Result, SnarlError};
use crate::storage::{RocksDbConfig, RocksDbHandle};
use crate::tangle::hash::{Hash, HASH_SIZE};
use crate::tangle::site::StoredSite;
use crate::tangle::store::SiteStore;
use std::path::Path;
use tracing::{debug, warn};

const CF_SITES: &str = "sites";
const CF_TIPS: &str = "tips";

const TIP_SET: [u8; 1] = [1];
const TIP_CLEAR: [u8; 1] = [0];

/// RocksDB-backed site store. The database directory is exclusive to one
/// store instance.
#[derive(Debug)]
pub struct DiskStore {
    db: RocksDbHandle,
}

impl DiskStore {
    /// Opens (creating if absent) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, &RocksDbConfig::default())
    }

    /// Opens a store with explicit RocksDB tuning.
    pub fn open_with_config(path: impl AsRef<Path>, config: &RocksDbConfig) -> Result<Self> {
        let db = RocksDbHandle::open(path.as_ref(), config, &[CF_SITES, CF_TIPS])?;
        debug!(path = %path.as_ref().display(), "opened tangle disk store");
        Ok(Self { db })
    }

    fn decode_checked(hash: &Hash, bytes: &[u8]) -> Option<StoredSite> {
        let site = match StoredSite::deserialize(bytes) {
            Ok(site) => site,
            Err(e) => {
                warn!(site = %hash, "stored site undecodable: {}", e);
                return None;
            }
        };
        if site.site_hash() != *hash {
            warn!(site = %hash, "stored site does not rehash to its key");
            return None;
        }
        Some(site)
    }

    fn parse_key(key: &[u8]) -> Option<Hash> {
        if key.len() != HASH_SIZE {
            warn!(key_len = key.len(), "skipping malformed site key");
            return None;
        }
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(key);
        Some(Hash::from_bytes(bytes))
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, hash: &Hash, bytes: &[u8]) -> Result<()> {
        self.db.put_raw(CF_SITES, hash.as_bytes(), bytes)
    }
}

impl SiteStore for DiskStore {
    fn put(&mut self, site: &StoredSite) -> Result<()> {
        let hash = site.site_hash();
        let mut record = site.clone();
        record.tip = false;
        let bytes = record.serialize()?;

        if let Some(existing) = self.db.get_raw(CF_SITES, hash.as_bytes())? {
            if existing != bytes {
                return Err(SnarlError::AlreadyPresent(hash.encode()));
            }
            return Ok(());
        }
        self.db.put_raw(CF_SITES, hash.as_bytes(), &bytes)
    }

    fn get(&self, hash: &Hash) -> Result<Option<StoredSite>> {
        Ok(self
            .db
            .get_raw(CF_SITES, hash.as_bytes())?
            .and_then(|bytes| Self::decode_checked(hash, &bytes)))
    }

    fn delete(&mut self, hash: &Hash) -> Result<()> {
        self.db.delete(CF_SITES, hash.as_bytes())?;
        self.db.delete(CF_TIPS, hash.as_bytes())
    }

    fn keys(&self) -> Result<Vec<Hash>> {
        let mut keys = Vec::new();
        self.db.iterate_all(CF_SITES, |key, _| {
            if let Some(hash) = Self::parse_key(key) {
                keys.push(hash);
            }
            true
        })?;
        Ok(keys)
    }

    fn tips(&self) -> Result<Vec<StoredSite>> {
        let mut flagged = Vec::new();
        self.db.iterate_all(CF_TIPS, |key, value| {
            if value == TIP_SET {
                if let Some(hash) = Self::parse_key(key) {
                    flagged.push(hash);
                }
            }
            true
        })?;

        let mut tips = Vec::with_capacity(flagged.len());
        for hash in flagged {
            match self.get(&hash)? {
                Some(mut site) => {
                    site.tip = true;
                    tips.push(site);
                }
                None => warn!(site = %hash, "tip flag points at missing site"),
            }
        }
        Ok(tips)
    }

    fn set_tip(&mut self, hash: &Hash, tip: bool) -> Result<()> {
        let flag = if tip { TIP_SET } else { TIP_CLEAR };
        self.db.put_raw(CF_TIPS, hash.as_bytes(), &flag)
    }

    fn close(&mut self) -> Result<()> {
        self.db.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tangle::site::Site;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> DiskStore {
        DiskStore::open(temp.path().join("tangle.db")).unwrap()
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let site = Site::genesis(b"persist").to_stored(false);
        let hash = site.site_hash();

        {
            let mut store = open_store(&temp);
            store.put(&site).unwrap();
            store.set_tip(&hash, true).unwrap();
            store.close().unwrap();
        }

        let store = open_store(&temp);
        assert_eq!(store.get(&hash).unwrap().unwrap().site_hash(), hash);
        let tips = store.tips().unwrap();
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].site_hash(), hash);
    }

    #[test]
    fn test_cleared_tip_flag_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let site = Site::genesis(b"flagged").to_stored(false);
        let hash = site.site_hash();

        {
            let mut store = open_store(&temp);
            store.put(&site).unwrap();
            store.set_tip(&hash, true).unwrap();
            store.set_tip(&hash, false).unwrap();
            store.close().unwrap();
        }

        let store = open_store(&temp);
        assert!(store.tips().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_body_read_as_absent() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);

        let hash = Hash::new(b"corrupt-key");
        store.insert_raw(&hash, &[0xba, 0xad]).unwrap();
        assert!(store.get(&hash).unwrap().is_none());
    }

    #[test]
    fn test_mismatched_body_read_as_absent() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);

        let impostor = Site::genesis(b"impostor").to_stored(false);
        let hash = Hash::new(b"victim-key");
        store
            .insert_raw(&hash, &impostor.serialize().unwrap())
            .unwrap();
        assert!(store.get(&hash).unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_body_and_flag() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);

        let site = Site::genesis(b"gone").to_stored(false);
        let hash = site.site_hash();
        store.put(&site).unwrap();
        store.set_tip(&hash, true).unwrap();

        store.delete(&hash).unwrap();
        assert!(store.get(&hash).unwrap().is_none());
        assert!(store.tips().unwrap().is_empty());
    }
}
