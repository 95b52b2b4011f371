//! Mini Cache - an embeddable in-process key-value cache
//!
//! Provides TTL expiration, a bounded LRU recency window, namespace-scoped
//! purges, a background reaper and binary snapshots for warm restarts.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use cache::{Cache, CacheStats};
pub use config::Config;
pub use error::{CacheError, Result};
