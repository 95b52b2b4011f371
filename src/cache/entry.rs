//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use crate::cache::lru::NodeRef;

// == Cache Entry ==
/// Represents a single cache entry with its encoded value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Codec-encoded value bytes
    pub value: Vec<u8>,
    /// TTL in seconds, 0 = never expires
    pub ttl: u64,
    /// Write timestamp (Unix milliseconds)
    pub written_at: i64,
    /// Handle to this entry's node in the eviction list, if tracked
    pub(crate) eviction_ref: Option<NodeRef>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new, untracked cache entry stamped with the current time.
    pub fn new(value: Vec<u8>, ttl: u64) -> Self {
        Self {
            value,
            ttl,
            written_at: current_timestamp_ms(),
            eviction_ref: None,
        }
    }

    // == Refresh ==
    /// Replaces value and TTL and restarts the expiry clock.
    ///
    /// The eviction handle is left untouched.
    pub fn refresh(&mut self, value: Vec<u8>, ttl: u64) {
        self.value = value;
        self.ttl = ttl;
        self.written_at = current_timestamp_ms();
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now` (Unix milliseconds).
    ///
    /// An entry with TTL 0 never expires. Otherwise it is expired once strictly
    /// more than `ttl` seconds have passed since it was written.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.ttl != 0 && now.saturating_sub(self.written_at) > self.ttl_ms()
    }

    /// Checks if the entry has expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if the entry never expires.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        if self.ttl == 0 {
            return None;
        }
        let elapsed = current_timestamp_ms().saturating_sub(self.written_at);
        Some(self.ttl_ms().saturating_sub(elapsed).max(0) as u64)
    }

    /// Whether the entry currently has a node in the recency window.
    pub fn is_tracked(&self) -> bool {
        self.eviction_ref.is_some()
    }

    fn ttl_ms(&self) -> i64 {
        i64::try_from(self.ttl)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
