//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// A missing key is never an error: lookups report it as `None`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Malformed input that cannot be normalized
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The eviction list has no free slot. Absorbed by the store.
    #[error("Eviction list capacity exceeded ({0} nodes)")]
    CapacityExceeded(usize),

    /// Inserting a new key would exceed the configured capacity
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Value could not be marshaled
    #[error("Encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Stored bytes could not be unmarshaled into the requested type
    #[error("Decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Snapshot blob could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    /// Snapshot file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
