//! The tangle engine: a content-addressed DAG of proof-of-work sites.
//!
//! The engine owns a pluggable [`SiteStore`] and an in-memory graph of
//! [`Site`] pointers plus the derived *tip set*: the sites no stored site
//! references. Appending a site validates its proof-of-work and parent
//! references, persists it, and hands tip status from the referenced
//! parents to the new site.
//!
//! All public operations are serialized by a single lock around the
//! `(store, tips)` pair. Appends are rare (gated by mining) and reads are
//! cheap, so finer-grained locking buys nothing and would break the
//! invariants linking tip state to parent updates. Mine sites *before*
//! submitting them; `add` never computes proof-of-work.

pub mod hash;
pub mod site;
pub mod store;

pub use hash::Hash;
pub use site::{Site, SiteType, StoredSite};
pub use store::{DiskStore, MemoryStore, SiteStore};

use crate::error::{Result, SnarlError};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Minimum weight applied when none is configured. Production deployments
/// raise this; tests mine against it.
pub const DEFAULT_MIN_WEIGHT: u32 = 1;

/// Content markers of the two bootstrap sites. Stable across versions:
/// they determine the genesis hashes every node agrees on.
const GENESIS_MARKERS: [&[u8]; 2] = [b"GENESIS_1", b"GENESIS_2"];

/// Engine configuration, set once at open time.
pub struct Options {
    /// The store backend to operate on
    pub store: Box<dyn SiteStore>,
    /// Minimum proof-of-work weight for submitted sites
    pub min_weight: u32,
}

impl Options {
    /// Creates options over the given store with the default weight.
    pub fn new(store: impl SiteStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            min_weight: DEFAULT_MIN_WEIGHT,
        }
    }

    /// Overrides the minimum proof-of-work weight.
    pub fn with_min_weight(mut self, min_weight: u32) -> Self {
        self.min_weight = min_weight;
        self
    }
}

/// Snapshot of the engine state for the operational surface.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    /// Total stored sites
    pub size: usize,
    /// Number of current tips
    pub tip_count: usize,
    /// Encoded hashes of the current tips
    pub tip_hashes: Vec<String>,
}

struct Inner {
    store: Box<dyn SiteStore>,
    sites: HashMap<Hash, Arc<Site>>,
    tips: BTreeSet<Hash>,
}

/// The tangle engine. One instance owns its store exclusively.
pub struct Tangle {
    inner: Mutex<Inner>,
    min_weight: u32,
}

impl Tangle {
    /// Opens the engine over a store.
    ///
    /// An empty store is seeded with the two genesis sites, both tips. A
    /// non-empty store is loaded in full: parent hashes are re-linked into
    /// an in-memory pointer graph, and the tip set is restored from the
    /// persisted tip index, falling back to a scan when the index is
    /// missing or stale.
    pub fn open(opts: Options) -> Result<Self> {
        let mut inner = Inner {
            store: opts.store,
            sites: HashMap::new(),
            tips: BTreeSet::new(),
        };

        let keys = inner.store.keys()?;
        if keys.is_empty() {
            inner.insert_genesis()?;
        } else {
            inner.restore(keys)?;
        }

        Ok(Self {
            inner: Mutex::new(inner),
            min_weight: opts.min_weight,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("tangle lock poisoned")
    }

    /// Returns a snapshot of the current tips, ordered by hash.
    pub fn tips(&self) -> Vec<Arc<Site>> {
        let inner = self.lock();
        inner
            .tips
            .iter()
            .filter_map(|hash| inner.sites.get(hash).cloned())
            .collect()
    }

    /// Looks up a site by hash.
    pub fn get(&self, hash: &Hash) -> Option<Arc<Site>> {
        self.lock().sites.get(hash).cloned()
    }

    /// Returns the total number of stored sites.
    pub fn size(&self) -> usize {
        self.lock().sites.len()
    }

    /// Returns the operational status snapshot.
    pub fn status(&self) -> Status {
        let inner = self.lock();
        Status {
            size: inner.sites.len(),
            tip_count: inner.tips.len(),
            tip_hashes: inner.tips.iter().map(Hash::encode).collect(),
        }
    }

    /// Appends a fully formed, already mined site.
    ///
    /// The protocol, in order: proof-of-work check, parent count check,
    /// parent resolution, duplicate check, persist (site body, then tip
    /// flags), in-memory commit. After success `tips()` reflects the
    /// hand-over from the referenced parents to the new site.
    pub fn add(&self, site: Site) -> Result<()> {
        let hash = site.hash();
        let weight = hash.weight();
        if weight < self.min_weight {
            return Err(SnarlError::WeightTooLow {
                weight,
                min: self.min_weight,
            });
        }
        if site.validates().len() < 2 {
            return Err(SnarlError::TooFewValidations(site.validates().len()));
        }

        let mut inner = self.lock();

        let parent_hashes: Vec<Hash> = site.validates().iter().map(|p| p.hash()).collect();
        for parent in &parent_hashes {
            if !inner.sites.contains_key(parent) {
                return Err(SnarlError::UnknownParent(parent.encode()));
            }
        }
        if inner.sites.contains_key(&hash) {
            return Err(SnarlError::AlreadyPresent(hash.encode()));
        }

        inner.store.put(&site.to_stored(true))?;
        for parent in &parent_hashes {
            inner.store.set_tip(parent, false)?;
        }
        inner.store.set_tip(&hash, true)?;

        for parent in &parent_hashes {
            inner.tips.remove(parent);
        }
        inner.tips.insert(hash);
        inner.sites.insert(hash, Arc::new(site));

        debug!(site = %hash, "appended site");
        Ok(())
    }

    /// Re-links a received record against the stored graph.
    ///
    /// Fails with `UnknownParent` if any referenced parent is not present;
    /// bulk receivers must deliver parents before children.
    pub fn resolve(&self, record: StoredSite) -> Result<Site> {
        let inner = self.lock();
        let mut parents = Vec::with_capacity(record.validates.len());
        for parent in &record.validates {
            let site = inner
                .sites
                .get(parent)
                .cloned()
                .ok_or_else(|| SnarlError::UnknownParent(parent.encode()))?;
            parents.push(site);
        }
        Ok(Site::from_stored(&record, parents))
    }

    /// Picks two distinct tips uniformly at random for a new site to
    /// validate. Returns `None` while fewer than two tips exist; the
    /// engine never duplicates a reference.
    pub fn select_tips(&self) -> Option<(Arc<Site>, Arc<Site>)> {
        let tips = self.tips();
        if tips.len() < 2 {
            return None;
        }
        let mut rng = rand::thread_rng();
        let mut picks = tips.choose_multiple(&mut rng, 2).cloned();
        let first = picks.next()?;
        let second = picks.next()?;
        Some((first, second))
    }

    /// Purges every stored site and re-seeds the genesis pair.
    ///
    /// Used by the peer-sync path when this node adopts a longer remote
    /// history.
    pub fn reinitialize(&self) -> Result<()> {
        let mut inner = self.lock();
        for key in inner.store.keys()? {
            inner.store.delete(&key)?;
        }
        inner.sites.clear();
        inner.tips.clear();
        inner.insert_genesis()
    }

    /// Flushes the store and releases its resources.
    pub fn close(&self) -> Result<()> {
        self.lock().store.close()
    }
}

impl Inner {
    fn insert_genesis(&mut self) -> Result<()> {
        for marker in GENESIS_MARKERS {
            let site = Arc::new(Site::genesis(marker));
            let hash = site.hash();
            self.store.put(&site.to_stored(true))?;
            self.store.set_tip(&hash, true)?;
            self.sites.insert(hash, site);
            self.tips.insert(hash);
        }
        Ok(())
    }

    /// Loads all stored sites, re-links the parent graph parents-first,
    /// and restores the tip set.
    fn restore(&mut self, keys: Vec<Hash>) -> Result<()> {
        let mut pending: HashMap<Hash, StoredSite> = HashMap::with_capacity(keys.len());
        for key in keys {
            match self.store.get(&key)? {
                Some(record) => {
                    pending.insert(key, record);
                }
                None => return Err(SnarlError::CorruptSite(key.encode())),
            }
        }

        // Worklist re-linking: a record becomes ready once all its parents
        // are built, so parents are always constructed before children.
        while !pending.is_empty() {
            let ready: Vec<Hash> = pending
                .iter()
                .filter(|(_, record)| {
                    record
                        .validates
                        .iter()
                        .all(|parent| self.sites.contains_key(parent))
                })
                .map(|(hash, _)| *hash)
                .collect();

            if ready.is_empty() {
                let dangling = pending
                    .values()
                    .flat_map(|record| record.validates.iter())
                    .find(|parent| {
                        !self.sites.contains_key(*parent) && !pending.contains_key(*parent)
                    })
                    .or_else(|| pending.values().flat_map(|r| r.validates.iter()).next())
                    .copied()
                    .unwrap_or(Hash::EMPTY);
                return Err(SnarlError::UnknownParent(dangling.encode()));
            }

            for hash in ready {
                let record = pending.remove(&hash).expect("ready key present");
                let parents = record
                    .validates
                    .iter()
                    .map(|parent| self.sites[parent].clone())
                    .collect();
                self.sites
                    .insert(hash, Arc::new(Site::from_stored(&record, parents)));
            }
        }

        self.restore_tips()
    }

    /// Restores the tip set from the persisted index, rebuilding it from a
    /// scan of the loaded graph when the index is missing or disagrees
    /// (e.g. after a crash between the body write and the flag updates).
    fn restore_tips(&mut self) -> Result<()> {
        let mut referenced: HashSet<Hash> = HashSet::new();
        for site in self.sites.values() {
            for parent in site.validates() {
                referenced.insert(parent.hash());
            }
        }
        let scanned: BTreeSet<Hash> = self
            .sites
            .keys()
            .filter(|hash| !referenced.contains(*hash))
            .copied()
            .collect();

        let indexed: BTreeSet<Hash> = self
            .store
            .tips()?
            .iter()
            .map(StoredSite::site_hash)
            .collect();

        if indexed != scanned {
            debug!(
                indexed = indexed.len(),
                scanned = scanned.len(),
                "tip index missing or stale, rebuilding from scan"
            );
            for hash in &indexed {
                if !scanned.contains(hash) {
                    self.store.set_tip(hash, false)?;
                }
            }
            for hash in &scanned {
                if !indexed.contains(hash) {
                    self.store.set_tip(hash, true)?;
                }
            }
        }

        self.tips = scanned;
        Ok(())
    }
}
