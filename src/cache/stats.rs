//! Cache Statistics Module
//!
//! Point-in-time summary of the cache: occupancy, recency window contents,
//! estimated memory footprint and hit/miss counters.

use std::fmt;

use serde::Serialize;

// == Counters ==
/// Running counters kept by the store across operations.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Counters {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing, including expired entries
    pub misses: u64,
    /// Entries removed because their TTL elapsed (lazily or by the reaper)
    pub expirations: u64,
    /// Keys pushed out of the recency window
    pub window_evictions: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_window_eviction(&mut self) {
        self.window_evictions += 1;
    }
}

// == Key Info ==
/// Expiry and tracking details of one stored key.
#[derive(Debug, Clone, Serialize)]
pub struct KeyInfo {
    /// Composite `namespace:key`
    pub key: String,
    /// Encoded value size in bytes
    pub size: usize,
    /// TTL in seconds, 0 = never expires
    pub ttl: u64,
    /// Milliseconds until expiry, None if the entry never expires
    pub ttl_remaining_ms: Option<u64>,
    pub expired: bool,
    /// Whether the key is in the recency window
    pub tracked: bool,
}

// == Cache Stats ==
/// Snapshot of cache state returned by `Cache::cache_stats`.
///
/// The `Display` impl renders the human-readable report used by `Cache::stats`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Maximum number of entries
    pub capacity: usize,
    /// Keys in the recency window, most recent first
    pub eviction_keys: Vec<String>,
    /// Capacity of the recency window
    pub eviction_capacity: usize,
    /// Estimated memory used by entries and window nodes, in bytes
    pub memory_bytes: usize,
    #[serde(flatten)]
    pub counters: Counters,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.counters.hits + self.counters.misses;
        if total == 0 {
            0.0
        } else {
            self.counters.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of Keys: {}", self.total_entries)?;
        writeln!(f, "Size: {}", self.capacity)?;
        writeln!(
            f,
            "Eviction Size: {}/{} Eviction list: '{}'",
            self.eviction_keys.len(),
            self.eviction_capacity,
            self.eviction_keys.join(", ")
        )?;
        writeln!(f, "Memory Usage: {}", self.memory_bytes)?;
        write!(
            f,
            "Hits: {} Misses: {} Expired: {} Window evictions: {} Hit rate: {:.2}",
            self.counters.hits,
            self.counters.misses,
            self.counters.expirations,
            self.counters.window_evictions,
            self.hit_rate()
        )
    }
}
