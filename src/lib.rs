//! # snarl
//!
//! Core of a peer-to-peer publication network: signed content is appended
//! to a persistent, content-addressed directed acyclic graph (the
//! *tangle*) and replicated across nodes.
//!
//! ## Features
//!
//! - **Content-addressed DAG**: every site is identified by its structural
//!   SHA3-256 hash; parent references form an append-only tangle
//! - **Proof of work**: sites are mined until their hash carries the
//!   required number of leading zero bits
//! - **Signed posts**: ML-DSA-65 detached signatures with ASCII-armored
//!   key and signature blocks
//! - **Pluggable storage**: in-memory backend for tests, RocksDB backend
//!   for production, both behind one store trait
//!
//! ## Example
//!
//! ```rust,no_run
//! use snarl::post::Post;
//! use snarl::crypto::KeyPair;
//! use snarl::tangle::{MemoryStore, Options, Site, SiteType, Tangle};
//! use rand::rngs::OsRng;
//!
//! # fn main() -> snarl::Result<()> {
//! let tangle = Tangle::open(Options::new(MemoryStore::new()))?;
//!
//! // Author a post and wrap it in a site
//! let keypair = KeyPair::generate_mldsa65(&mut OsRng)?;
//! let post = Post::create("hello, tangle\n", &keypair)?;
//! let (tip_a, tip_b) = tangle.select_tips().expect("two tips at bootstrap");
//!
//! let mut site = Site::new(post.hash(), SiteType::Post, vec![tip_a, tip_b])
//!     .with_data(post.to_transport()?);
//! site.mine(1);
//! tangle.add(site)?;
//! # Ok(())
//! # }
//! ```

pub mod armor;
pub mod crypto;
pub mod error;
pub mod post;
pub mod rpc;
pub mod storage;
pub mod tangle;

pub use error::{Result, SnarlError};
pub use tangle::{Hash, Options, Site, SiteType, Status, StoredSite, Tangle};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
