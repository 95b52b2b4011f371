//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// TTL in seconds applied when a caller passes a negative TTL
    pub default_ttl: u64,
    /// Number of keys tracked by the recency window
    pub eviction_capacity: usize,
    /// Reaper sweep period in seconds, values below 1 leave it off
    pub cleanup_interval: i32,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `EVICTION_CAPACITY` - Recency window size (default: 100)
    /// - `CLEANUP_INTERVAL` - Reaper period in seconds (default: 0, disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            eviction_capacity: parse_var("EVICTION_CAPACITY")
                .unwrap_or(defaults.eviction_capacity),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: crate::cache::DEFAULT_TTL,
            eviction_capacity: crate::cache::EVICTION_CAPACITY,
            cleanup_interval: 0,
        }
    }
}
