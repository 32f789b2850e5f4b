//! Shared storage infrastructure.
//!
//! Generic RocksDB plumbing used by the persistent tangle store backend.

pub mod rocksdb;

pub use rocksdb::{RocksDbConfig, RocksDbHandle};
