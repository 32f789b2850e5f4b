//! Error types for snarl operations.

use thiserror::Error;

/// Result type alias for snarl operations.
pub type Result<T> = std::result::Result<T, SnarlError>;

/// Main error type for snarl operations.
///
/// The tangle append protocol surfaces the first four variants; the
/// remaining variants belong to the store, post and armor layers. Errors
/// propagate to the caller unchanged, the engine performs no recovery.
#[derive(Error, Debug)]
pub enum SnarlError {
    /// Candidate site fails the proof-of-work check
    #[error("site weight {weight} below required minimum {min}")]
    WeightTooLow { weight: u32, min: u32 },

    /// Candidate site references fewer than two parents
    #[error("site validates {0} parent(s), at least 2 required")]
    TooFewValidations(usize),

    /// A referenced parent does not resolve in the store
    #[error("unknown parent site {0}")]
    UnknownParent(String),

    /// The site hash collides with an already stored site
    #[error("site {0} already present")]
    AlreadyPresent(String),

    /// Wrapped backend failure
    #[error("store error: {0}")]
    Store(String),

    /// Retrieved bytes do not rehash to the requested key
    #[error("corrupt site: stored bytes do not rehash to {0}")]
    CorruptSite(String),

    /// A post signature did not validate
    #[error("signature verification failed: {0}")]
    VerifyFailed(String),

    /// An armored block or binary record failed to parse
    #[error("decode error: {0}")]
    Decode(String),

    /// Armor encoding/decoding errors
    #[error("armor error: {0}")]
    Armor(String),

    /// Key construction or reconstruction errors
    #[error("key error: {0}")]
    Key(String),

    /// Signature construction errors
    #[error("signature error: {0}")]
    Signature(String),

    /// Serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnarlError {
    /// Creates a new store error.
    pub fn store<T: ToString>(msg: T) -> Self {
        Self::Store(msg.to_string())
    }

    /// Creates a new verification error.
    pub fn verify<T: ToString>(msg: T) -> Self {
        Self::VerifyFailed(msg.to_string())
    }

    /// Creates a new decode error.
    pub fn decode<T: ToString>(msg: T) -> Self {
        Self::Decode(msg.to_string())
    }

    /// Creates a new armor error.
    pub fn armor<T: ToString>(msg: T) -> Self {
        Self::Armor(msg.to_string())
    }

    /// Creates a new key error.
    pub fn key<T: ToString>(msg: T) -> Self {
        Self::Key(msg.to_string())
    }

    /// Creates a new signature error.
    pub fn signature<T: ToString>(msg: T) -> Self {
        Self::Signature(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }
}
