//! Cache Module
//!
//! Provides in-process caching with TTL expiration, a bounded LRU recency
//! window and namespace-scoped purges.

pub mod codec;
mod entry;
mod handle;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use handle::Cache;
pub use lru::{EvictionList, NodeRef};
pub use stats::{CacheStats, Counters, KeyInfo};
pub use store::CacheStore;

// == Public Constants ==
/// TTL in seconds applied when a caller passes a negative TTL
pub const DEFAULT_TTL: u64 = 300;

/// Default number of keys tracked by the recency window
pub const EVICTION_CAPACITY: usize = 100;

/// Namespace used by the un-scoped operations
pub const DEFAULT_NAMESPACE: &str = "default";

/// Separator between namespace and user key
pub const KEY_SEPARATOR: char = ':';
