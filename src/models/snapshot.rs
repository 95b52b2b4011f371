//! Snapshot DTOs
//!
//! On-disk representation of the cache aggregate, encoded with bincode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// A persisted entry. The window handle is transient and never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntry {
    /// Codec-encoded value bytes
    pub value: Vec<u8>,
    /// TTL in seconds, 0 = never expires
    pub ttl: u64,
    /// Original write timestamp (Unix milliseconds)
    pub written_at: i64,
}

/// Point-in-time copy of the cache's persistent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version, checked on decode
    pub version: u32,
    /// Composite key -> entry, sorted so equal caches encode identically
    pub entries: BTreeMap<String, PersistedEntry>,
    /// Registered namespaces
    pub namespaces: Vec<String>,
    /// Live entry count at save time
    pub length: u64,
    /// Configured entry capacity
    pub capacity: u64,
}

impl Snapshot {
    pub const VERSION: u32 = 1;

    /// Encodes the snapshot into a self-contained blob.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a blob produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(bytes)?;
        if snapshot.version != Self::VERSION {
            return Err(CacheError::Snapshot(Box::new(bincode::ErrorKind::Custom(
                format!(
                    "unsupported snapshot version {} (expected {})",
                    snapshot.version,
                    Self::VERSION
                ),
            ))));
        }
        Ok(snapshot)
    }
}
