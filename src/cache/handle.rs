//! Shared Cache Handle
//!
//! `Cache` wraps a [`CacheStore`] in `Arc<RwLock<_>>` so it can be cloned
//! across tasks, and owns the optional reaper task.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore, KeyInfo, DEFAULT_NAMESPACE};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::Snapshot;
use crate::tasks::Reaper;

/// Thread-safe, cloneable cache.
///
/// One reader/writer lock guards the entry map, the recency window and the
/// counters together. `get` takes the write side because a hit reorders the
/// recency window and an expired entry is evicted in place; `keys`, `len` and
/// `stats` only read.
#[derive(Debug, Clone)]
pub struct Cache {
    store: Arc<RwLock<CacheStore>>,
    reaper: Arc<Mutex<Option<Reaper>>>,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache holding at most `size` entries, with the default TTL
    /// and recency window.
    pub fn new(size: usize) -> Self {
        Self::from_config(&Config {
            max_entries: size,
            ..Config::default()
        })
    }

    pub fn from_config(config: &Config) -> Self {
        Self::from_store(CacheStore::from_config(config))
    }

    /// Builds a cache from `config` and starts the reaper with
    /// `config.cleanup_interval` (a period below 1 leaves it off).
    ///
    /// Must be called from within a tokio runtime when the reaper is enabled.
    pub async fn start_from_config(config: &Config) -> Result<Self> {
        let cache = Self::from_config(config);
        cache.start(config.cleanup_interval).await?;
        Ok(cache)
    }

    pub fn from_store(store: CacheStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            reaper: Arc::new(Mutex::new(None)),
        }
    }

    // == Default Namespace Operations ==
    /// Stores `value` under `key` for `ttl` seconds (0 = forever, negative =
    /// default TTL).
    pub async fn set<V: Serialize + ?Sized>(&self, key: &str, value: &V, ttl: i64) -> Result<()> {
        self.set_in(DEFAULT_NAMESPACE, key, value, ttl).await
    }

    /// Returns the value under `key`, or `None` if it is absent or expired.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get_in(DEFAULT_NAMESPACE, key).await
    }

    /// Writes the value under `key` into `out`, or `T::default()` on a miss.
    ///
    /// Returns whether the key was found.
    pub async fn get_into<T: DeserializeOwned + Default>(&self, key: &str, out: &mut T) -> Result<bool> {
        match self.get(key).await? {
            Some(value) => {
                *out = value;
                Ok(true)
            }
            None => {
                *out = T::default();
                Ok(false)
            }
        }
    }

    /// Removes `key`. Removing an absent key is not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.remove_in(DEFAULT_NAMESPACE, key).await
    }

    // == Namespaced Operations ==
    pub async fn set_in<V: Serialize + ?Sized>(
        &self,
        namespace: &str,
        key: &str,
        value: &V,
        ttl: i64,
    ) -> Result<()> {
        self.store.write().await.set(namespace, key, value, ttl)
    }

    pub async fn get_in<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Result<Option<T>> {
        self.store.write().await.get(namespace, key)
    }

    pub async fn remove_in(&self, namespace: &str, key: &str) -> Result<()> {
        self.store.write().await.remove(namespace, key);
        Ok(())
    }

    /// Registers a namespace so that [`purge`](Self::purge) covers it even
    /// before any key is written to it.
    pub async fn register_namespace(&self, namespace: &str) -> Result<()> {
        self.store.write().await.register_namespace(namespace)?;
        Ok(())
    }

    pub async fn namespaces(&self) -> Result<Vec<String>> {
        Ok(self.store.read().await.namespaces().to_vec())
    }

    /// Removes every key of one namespace, returning how many were removed.
    pub async fn purge_namespace(&self, namespace: &str) -> Result<usize> {
        let evicted = self.store.write().await.purge_namespace(namespace)?;
        info!(namespace, evicted, "Purged namespace");
        Ok(evicted)
    }

    // == Bulk & Introspection ==
    /// Removes every entry of every namespace and empties the recency window.
    pub async fn purge(&self) -> Result<()> {
        let evicted = self.store.write().await.purge();
        info!(evicted, "Purged cache");
        Ok(())
    }

    /// Snapshot of all composite (`namespace:key`) keys.
    pub async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.store.read().await.keys())
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.store.read().await.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.store.read().await.is_empty())
    }

    /// Human-readable summary of the cache.
    pub async fn stats(&self) -> Result<String> {
        Ok(self.cache_stats().await?.to_string())
    }

    /// Structured form of [`stats`](Self::stats).
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        Ok(self.store.read().await.stats())
    }

    /// Expiry and recency details for every stored key.
    pub async fn inspect(&self) -> Result<Vec<KeyInfo>> {
        Ok(self.store.read().await.inspect())
    }

    /// Runs one expiry sweep now, returning the number of entries removed.
    pub async fn sweep_expired(&self) -> Result<usize> {
        Ok(self.store.write().await.sweep_expired())
    }

    /// Checks the invariants between entries, counters and recency window.
    pub async fn check_integrity(&self) -> std::result::Result<(), String> {
        self.store.read().await.check_integrity()
    }

    // == Reaper Lifecycle ==
    /// Starts the background reaper sweeping every `period_secs` seconds.
    ///
    /// A period below 1 leaves the reaper off. Starting twice without a
    /// [`stop`](Self::stop) in between is rejected.
    pub async fn start(&self, period_secs: i32) -> Result<()> {
        let mut slot = self.reaper.lock().await;
        if slot.is_some() {
            return Err(CacheError::InvalidRequest(
                "Reaper is already running".to_string(),
            ));
        }
        if period_secs < 1 {
            debug!(period_secs, "Reaper disabled");
            return Ok(());
        }

        let period = Duration::from_secs(period_secs as u64);
        *slot = Some(Reaper::spawn(Arc::downgrade(&self.store), period));
        Ok(())
    }

    /// Stops the reaper and waits for it to exit. No-op if it is not running.
    pub async fn stop(&self) {
        let reaper = self.reaper.lock().await.take();
        if let Some(reaper) = reaper {
            reaper.stop().await;
        }
    }

    pub async fn is_reaper_running(&self) -> bool {
        self.reaper
            .lock()
            .await
            .as_ref()
            .is_some_and(|reaper| !reaper.is_finished())
    }

    // == Persistence ==
    /// Writes a snapshot of the cache to `path`.
    ///
    /// The write lock is held while encoding and writing, so the file reflects
    /// one consistent state.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let store = self.store.write().await;
        let bytes = store.to_snapshot().encode()?;
        tokio::fs::write(path, &bytes).await?;
        info!(path = %path.display(), entries = store.len(), bytes = bytes.len(), "Saved snapshot");
        Ok(())
    }

    /// Loads a snapshot written by [`save`](Self::save) using the default
    /// configuration for settings the snapshot does not carry.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_config(path, &Config::default()).await
    }

    /// Loads a snapshot; the recency window size and default TTL come from
    /// `config`. The reaper is not started.
    pub async fn load_with_config(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let snapshot = Snapshot::decode(&bytes)?;
        let store = CacheStore::from_snapshot(snapshot, config);
        info!(path = %path.display(), entries = store.len(), "Loaded snapshot");
        Ok(Self::from_store(store))
    }
}
