//! Cache Store Module
//!
//! Main cache engine combining the entry map with the eviction list and TTL
//! expiration. Every method assumes the caller holds exclusive access; the
//! shared, lock-guarded handle lives in [`crate::cache::Cache`].

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{
    codec, CacheEntry, CacheStats, Counters, EvictionList, KeyInfo, DEFAULT_NAMESPACE,
    KEY_SEPARATOR,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{PersistedEntry, Snapshot};

// == Cache Store ==
/// Cache storage with a bounded recency window and TTL support.
///
/// Two capacities apply: `size` bounds the number of entries, while the
/// eviction list bounds how many of them are recency-tracked. Entries pushed
/// out of the window stay stored and counted.
#[derive(Debug)]
pub struct CacheStore {
    /// Composite key -> entry
    entries: HashMap<String, CacheEntry>,
    /// Recency window
    eviction: EvictionList,
    /// Registered namespaces, `default` first
    namespaces: Vec<String>,
    /// Live entry count
    length: usize,
    /// Maximum number of entries allowed
    size: usize,
    /// TTL used when a caller passes a negative TTL
    default_ttl: u64,
    counters: Counters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `size` - Maximum number of entries the cache can hold
    /// * `eviction_capacity` - Number of keys the recency window tracks
    /// * `default_ttl` - TTL in seconds substituted for negative TTLs
    pub fn new(size: usize, eviction_capacity: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            eviction: EvictionList::new(eviction_capacity),
            namespaces: vec![DEFAULT_NAMESPACE.to_string()],
            length: 0,
            size,
            default_ttl,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_entries,
            config.eviction_capacity,
            config.default_ttl,
        )
    }

    // == Keys & Namespaces ==
    /// Builds the composite key stored in the map.
    pub fn make_key(namespace: &str, key: &str) -> String {
        format!("{namespace}{KEY_SEPARATOR}{key}")
    }

    /// Registers a namespace for prefix purges. Returns false if it was
    /// already known.
    pub fn register_namespace(&mut self, namespace: &str) -> Result<bool> {
        validate_namespace(namespace)?;
        if self.namespaces.iter().any(|ns| ns == namespace) {
            return Ok(false);
        }
        self.namespaces.push(namespace.to_string());
        debug!(namespace, "Registered namespace");
        Ok(true)
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    // == Set ==
    /// Marshals `value` and stores it under `namespace:key`.
    ///
    /// A negative `ttl` is replaced by the default TTL, 0 never expires.
    /// Overwriting an existing key refreshes value, TTL and timestamp and never
    /// fails on capacity. A new key fails with `CacheFull` once `size` entries
    /// are live, leaving the store untouched.
    pub fn set<V: Serialize + ?Sized>(
        &mut self,
        namespace: &str,
        key: &str,
        value: &V,
        ttl: i64,
    ) -> Result<()> {
        validate_namespace(namespace)?;
        let ttl = self.normalize_ttl(ttl);
        let bytes = codec::marshal(value)?;
        let cache_key = Self::make_key(namespace, key);

        match self.entries.get_mut(&cache_key) {
            Some(entry) => entry.refresh(bytes, ttl),
            None => {
                if self.length >= self.size {
                    return Err(CacheError::CacheFull(format!(
                        "capacity of {} entries reached, cannot insert '{}'",
                        self.size, cache_key
                    )));
                }
                self.entries
                    .insert(cache_key.clone(), CacheEntry::new(bytes, ttl));
                self.length += 1;
            }
        }

        self.touch(&cache_key);
        self.register_namespace(namespace)?;
        debug!(key = %cache_key, ttl, "Stored entry");
        Ok(())
    }

    // == Get ==
    /// Looks up `namespace:key` and unmarshals its value.
    ///
    /// Returns `Ok(None)` when the key is absent or has expired; an expired
    /// entry is evicted on the way out. A hit moves the key to the head of the
    /// recency window.
    pub fn get<T: DeserializeOwned>(&mut self, namespace: &str, key: &str) -> Result<Option<T>> {
        let cache_key = Self::make_key(namespace, key);
        let now = current_timestamp_ms();

        let expired = match self.entries.get(&cache_key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.counters.record_miss();
                return Ok(None);
            }
        };

        if expired {
            self.evict(&cache_key);
            self.counters.record_expiration();
            self.counters.record_miss();
            debug!(key = %cache_key, "Evicted expired entry on read");
            return Ok(None);
        }

        let value = match self.entries.get(&cache_key) {
            Some(entry) => codec::unmarshal(&entry.value)?,
            None => return Ok(None),
        };
        self.touch(&cache_key);
        self.counters.record_hit();
        Ok(Some(value))
    }

    // == Remove ==
    /// Removes `namespace:key`. Returns whether an entry was removed.
    pub fn remove(&mut self, namespace: &str, key: &str) -> bool {
        let cache_key = Self::make_key(namespace, key);
        let removed = self.evict(&cache_key);
        if removed {
            debug!(key = %cache_key, "Removed entry");
        }
        removed
    }

    // == Purge ==
    /// Evicts every key of every registered namespace, then clears the
    /// recency window. Returns the number of entries removed.
    pub fn purge(&mut self) -> usize {
        let namespaces = self.namespaces.clone();
        let evicted: usize = namespaces
            .iter()
            .map(|namespace| self.purge_prefix(namespace))
            .sum();
        self.eviction.clear();
        evicted
    }

    /// Evicts every key of a single namespace.
    pub fn purge_namespace(&mut self, namespace: &str) -> Result<usize> {
        validate_namespace(namespace)?;
        Ok(self.purge_prefix(namespace))
    }

    fn purge_prefix(&mut self, namespace: &str) -> usize {
        let prefix = format!("{namespace}{KEY_SEPARATOR}");
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        let mut evicted = 0;
        for key in doomed {
            if self.evict(&key) {
                evicted += 1;
            }
        }
        evicted
    }

    // == Sweep Expired ==
    /// Removes all expired entries through the same path as [`remove`](Self::remove).
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let mut count = 0;
        for key in expired {
            if self.evict(&key) {
                self.counters.record_expiration();
                count += 1;
            } else {
                warn!(key = %key, "Expired entry vanished during sweep");
            }
        }
        count
    }

    // == Accessors ==
    /// Snapshot of all composite keys.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Per-key expiry and tracking details.
    pub fn inspect(&self) -> Vec<KeyInfo> {
        self.entries
            .iter()
            .map(|(key, entry)| KeyInfo {
                key: key.clone(),
                size: entry.value.len(),
                ttl: entry.ttl,
                ttl_remaining_ms: entry.ttl_remaining_ms(),
                expired: entry.is_expired(),
                tracked: entry.is_tracked(),
            })
            .collect()
    }

    /// Keys in the recency window, most recent first.
    pub fn eviction_keys(&self) -> Vec<String> {
        self.eviction.keys()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.length,
            capacity: self.size,
            eviction_keys: self.eviction.keys(),
            eviction_capacity: self.eviction.capacity(),
            memory_bytes: self.memory_usage(),
            counters: self.counters,
        }
    }

    /// Estimated bytes held by entries, keys and window nodes.
    pub fn memory_usage(&self) -> usize {
        let entries: usize = self
            .entries
            .iter()
            .map(|(key, entry)| key.len() + entry.value.len() + std::mem::size_of::<CacheEntry>())
            .sum();
        entries + self.eviction.memory_usage()
    }

    // == Integrity ==
    /// Verifies the cross-structure invariants between the map, the counters
    /// and the recency window.
    pub fn check_integrity(&self) -> std::result::Result<(), String> {
        if self.length != self.entries.len() {
            return Err(format!(
                "length {} does not match {} stored entries",
                self.length,
                self.entries.len()
            ));
        }
        if self.length > self.size {
            return Err(format!("length {} exceeds capacity {}", self.length, self.size));
        }
        if !self.eviction.is_consistent() {
            return Err("eviction list links are corrupted".to_string());
        }

        let mut tracked = 0;
        for (key, entry) in &self.entries {
            if let Some(node) = entry.eviction_ref {
                tracked += 1;
                if self.eviction.key(node) != Some(key.as_str()) {
                    return Err(format!("entry '{key}' points at a foreign or dead node"));
                }
            }
        }
        let window = self.eviction.keys();
        let unique: HashSet<&String> = window.iter().collect();
        if tracked != window.len() || unique.len() != window.len() {
            return Err(format!(
                "{} tracked entries but {} window nodes ({} unique)",
                tracked,
                window.len(),
                unique.len()
            ));
        }
        Ok(())
    }

    // == Snapshot ==
    /// Captures the persistent part of the store.
    pub fn to_snapshot(&self) -> Snapshot {
        let entries: BTreeMap<String, PersistedEntry> = self
            .entries
            .iter()
            .map(|(key, entry)| {
                let persisted = PersistedEntry {
                    value: entry.value.clone(),
                    ttl: entry.ttl,
                    written_at: entry.written_at,
                };
                (key.clone(), persisted)
            })
            .collect();

        Snapshot {
            version: Snapshot::VERSION,
            entries,
            namespaces: self.namespaces.clone(),
            length: self.length as u64,
            capacity: self.size as u64,
        }
    }

    /// Rebuilds a store from a snapshot.
    ///
    /// Entries keep their original write time, so TTLs keep counting from it.
    /// Window nodes are rebuilt for as many entries as the window holds; the
    /// recency order before the save is not restored.
    pub fn from_snapshot(snapshot: Snapshot, config: &Config) -> Self {
        let mut store = Self::new(
            snapshot.capacity as usize,
            config.eviction_capacity,
            config.default_ttl,
        );
        for namespace in &snapshot.namespaces {
            if let Err(err) = store.register_namespace(namespace) {
                warn!(namespace = %namespace, error = %err, "Skipping invalid namespace in snapshot");
            }
        }

        for (key, persisted) in snapshot.entries {
            // Purge only reaches keys under a registered namespace
            let namespace = key.split_once(KEY_SEPARATOR).map(|(ns, _)| ns);
            match namespace.map(|ns| store.register_namespace(ns)) {
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(key = %key, error = %err, "Dropping snapshot entry with invalid namespace");
                    continue;
                }
                None => {
                    warn!(key = %key, "Dropping snapshot entry without a namespace");
                    continue;
                }
            }
            let entry = CacheEntry {
                value: persisted.value,
                ttl: persisted.ttl,
                written_at: persisted.written_at,
                eviction_ref: None,
            };
            store.entries.insert(key.clone(), entry);
            if !store.eviction.is_full() {
                store.touch(&key);
            }
        }

        store.length = store.entries.len();
        if snapshot.length as usize != store.length {
            warn!(
                recorded = snapshot.length,
                actual = store.length,
                "Snapshot length disagrees with its entries, using entry count"
            );
        }
        if store.length > store.size {
            warn!(
                length = store.length,
                capacity = store.size,
                "Snapshot holds more entries than its capacity, new keys will be rejected"
            );
        }
        store
    }

    // == Internal ==
    fn normalize_ttl(&self, ttl: i64) -> u64 {
        u64::try_from(ttl).unwrap_or(self.default_ttl)
    }

    /// Removes an entry together with its window node.
    fn evict(&mut self, cache_key: &str) -> bool {
        let Some(entry) = self.entries.remove(cache_key) else {
            return false;
        };
        if let Some(node) = entry.eviction_ref {
            self.eviction.remove_node(node);
        }
        self.length = self.length.saturating_sub(1);
        true
    }

    /// Moves a stored key to the head of the window, linking a node for it
    /// first if it is not tracked. A full window drops its tail to make room.
    fn touch(&mut self, cache_key: &str) {
        let Some(current) = self.entries.get(cache_key).map(|e| e.eviction_ref) else {
            return;
        };
        if let Some(node) = current {
            if self.eviction.move_to_head(node) {
                return;
            }
        }

        if self.eviction.is_full() {
            if let Some(dropped) = self.eviction.remove_tail() {
                if let Some(entry) = self.entries.get_mut(&dropped) {
                    entry.eviction_ref = None;
                }
                self.counters.record_window_eviction();
                debug!(key = %dropped, "Dropped key from recency window");
            }
        }

        let node = match self.eviction.insert_head(cache_key.to_string()) {
            Ok(node) => Some(node),
            Err(err) => {
                debug!(key = %cache_key, error = %err, "Key left untracked");
                None
            }
        };
        if let Some(entry) = self.entries.get_mut(cache_key) {
            entry.eviction_ref = node;
        }
    }
}

fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Namespace cannot be empty".to_string(),
        ));
    }
    if namespace.contains(KEY_SEPARATOR) {
        return Err(CacheError::InvalidRequest(format!(
            "Namespace '{namespace}' cannot contain '{KEY_SEPARATOR}'"
        )));
    }
    Ok(())
}
