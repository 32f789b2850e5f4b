//! Generic RocksDB helpers: configuration, handle and raw operations.
//!
//! Contains no tangle-specific logic; the tangle's disk store builds its
//! namespace layout on top of these primitives.

use crate::error::{Result, SnarlError};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options,
};
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// Configuration for RocksDB storage.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Maximum number of open files.
    pub max_open_files: i32,
    /// Number of log files to keep.
    pub keep_log_file_num: usize,
    /// Maximum WAL size in bytes.
    pub max_wal_size: u64,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            max_open_files: 128,
            keep_log_file_num: 2,
            max_wal_size: 32 * 1024 * 1024,      // 32MB
            write_buffer_size: 32 * 1024 * 1024, // 32MB
        }
    }
}

impl RocksDbConfig {
    /// Builds RocksDB options from this configuration.
    pub fn build_options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(self.max_open_files);
        opts.set_keep_log_file_num(self.keep_log_file_num);
        opts.set_max_total_wal_size(self.max_wal_size);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }
}

/// A wrapper around a RocksDB database with named column families.
pub struct RocksDbHandle {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksDbHandle {
    /// Opens (creating if absent) a database with the given column families.
    pub fn open(
        db_path: impl AsRef<Path>,
        config: &RocksDbConfig,
        column_families: &[&str],
    ) -> Result<Self> {
        let opts = config.build_options();
        let cf_opts = Options::default();

        let cf_descriptors: Vec<_> = column_families
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(*cf, cf_opts.clone()))
            .collect();

        let db = DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(
            &opts,
            db_path.as_ref(),
            cf_descriptors,
        )
        .map_err(|e| SnarlError::store(format!("failed to open RocksDB: {}", e)))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Returns a column family handle by name.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| SnarlError::store(format!("column family '{}' not found", name)))
    }

    /// Stores raw bytes under the given key.
    pub fn put_raw(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf(cf_name)?;
        trace!(cf = cf_name, key_len = key.len(), value_len = value.len(), "db put");
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| SnarlError::store(format!("failed to write: {}", e)))
    }

    /// Loads raw bytes from the given key.
    pub fn get_raw(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| SnarlError::store(format!("failed to read: {}", e)))
    }

    /// Checks whether a key exists.
    pub fn exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        Ok(self.get_raw(cf_name, key)?.is_some())
    }

    /// Deletes a key.
    pub fn delete(&self, cf_name: &str, key: &[u8]) -> Result<()> {
        let cf = self.cf(cf_name)?;
        trace!(cf = cf_name, key_len = key.len(), "db delete");
        self.db
            .delete_cf(&cf, key)
            .map_err(|e| SnarlError::store(format!("failed to delete: {}", e)))
    }

    /// Iterates over all entries in a column family.
    ///
    /// The callback returns `true` to continue or `false` to stop.
    pub fn iterate_all<F>(&self, cf_name: &str, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> bool,
    {
        let cf = self.cf(cf_name)?;
        let iter = self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start);

        for item in iter {
            let (key, value) =
                item.map_err(|e| SnarlError::store(format!("iterator error: {}", e)))?;
            if !callback(&key, &value) {
                break;
            }
        }
        Ok(())
    }

    /// Flushes pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| SnarlError::store(format!("failed to flush: {}", e)))
    }
}

impl std::fmt::Debug for RocksDbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_db() -> (RocksDbHandle, TempDir) {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db = RocksDbHandle::open(
            temp_dir.path().join("db"),
            &RocksDbConfig::default(),
            &["data", "meta"],
        )
        .expect("failed to open db");
        (db, temp_dir)
    }

    #[test]
    fn test_put_get_raw() {
        let (db, _temp) = create_test_db();

        db.put_raw("data", b"key", b"value").unwrap();
        assert_eq!(db.get_raw("data", b"key").unwrap().unwrap(), b"value");
        assert!(db.get_raw("data", b"missing").unwrap().is_none());
    }

    #[test]
    fn test_column_families_are_separate() {
        let (db, _temp) = create_test_db();

        db.put_raw("data", b"key", b"in data").unwrap();
        assert!(db.get_raw("meta", b"key").unwrap().is_none());
    }

    #[test]
    fn test_exists_and_delete() {
        let (db, _temp) = create_test_db();

        db.put_raw("meta", b"key", b"value").unwrap();
        assert!(db.exists("meta", b"key").unwrap());

        db.delete("meta", b"key").unwrap();
        assert!(!db.exists("meta", b"key").unwrap());
    }

    #[test]
    fn test_iterate_all() {
        let (db, _temp) = create_test_db();

        db.put_raw("data", b"a", b"1").unwrap();
        db.put_raw("data", b"b", b"2").unwrap();
        db.put_raw("data", b"c", b"3").unwrap();

        let mut seen = Vec::new();
        db.iterate_all("data", |key, _| {
            seen.push(key.to_vec());
            true
        })
        .unwrap();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_iterate_early_stop() {
        let (db, _temp) = create_test_db();

        db.put_raw("data", b"a", b"1").unwrap();
        db.put_raw("data", b"b", b"2").unwrap();

        let mut count = 0;
        db.iterate_all("data", |_, _| {
            count += 1;
            false
        })
        .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unknown_column_family() {
        let (db, _temp) = create_test_db();
        assert!(db.put_raw("nope", b"k", b"v").is_err());
    }
}
