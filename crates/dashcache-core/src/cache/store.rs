//! TTL-aware key/value store over a persisted storage backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, de::IgnoredAny, Serialize};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::entry::{CacheEntry, CacheStatus};
use super::error::CacheError;
use super::storage::{MemoryStorage, StorageBackend};

/// Prefix applied to every key this store writes into its backend.
pub const DEFAULT_NAMESPACE: &str = "dashcache:";

/// Expired entries are kept this long past `expires_at` before a sweep may
/// reclaim them, so offline users still have something to look at.
pub const DEFAULT_GRACE_PERIOD_HOURS: i64 = 24;

/// Handle for a write that was issued before a network fetch started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTicket {
    key: String,
    generation: u64,
}

impl WriteTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// A newer write for the same key was already committed; nothing written.
    Superseded,
}

/// One owned entry as listed by [`CacheStore::entries`].
#[derive(Debug, Clone)]
pub struct EntrySummary {
    pub key: String,
    /// `None` when the stored value could not be parsed.
    pub status: Option<CacheStatus>,
    pub size_bytes: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct KeyGenerations {
    issued: u64,
    committed: u64,
}

/// Process-wide cache of TTL-stamped entries.
///
/// Construct one per application and share it behind an `Arc`. Reads never
/// fail: a missing, unreadable or corrupt entry is a miss.
pub struct CacheStore {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    namespace: String,
    grace_period: chrono::Duration,
    generations: Mutex<HashMap<String, KeyGenerations>>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            namespace: DEFAULT_NAMESPACE.to_string(),
            grace_period: chrono::Duration::hours(DEFAULT_GRACE_PERIOD_HOURS),
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Store backed by an unbounded [`MemoryStorage`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Negative periods are treated as zero so a sweep never reaches
    /// entries that have not yet expired.
    pub fn with_grace_period(mut self, grace_period: chrono::Duration) -> Self {
        self.grace_period = grace_period.max(chrono::Duration::zero());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn grace_period(&self) -> chrono::Duration {
        self.grace_period
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Keys owned by this store, without the namespace prefix.
    fn owned_keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self
            .backend
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.namespace).map(str::to_string))
            .collect())
    }

    // ===== Reads =====

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.backend.get_item(&self.storage_key(key)) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(key = key, error = %e, "Failed to read cache entry");
                None
            }
        }
    }

    fn parse<T: DeserializeOwned>(key: &str, contents: &str) -> Option<CacheEntry<T>> {
        match serde_json::from_str(contents) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(key = key, error = %e, "Ignoring corrupt cache entry");
                None
            }
        }
    }

    /// The stored entry with its timestamps, regardless of staleness.
    pub fn get_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let contents = self.read_raw(key)?;
        Self::parse(key, &contents)
    }

    /// The stored data, regardless of staleness.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_entry(key).map(|entry| entry.data)
    }

    pub fn get_status(&self, key: &str) -> Option<CacheStatus> {
        let entry: CacheEntry<IgnoredAny> = self.get_entry(key)?;
        Some(entry.status(self.now()))
    }

    /// Missing entries count as stale.
    pub fn is_stale(&self, key: &str) -> bool {
        self.get_status(key).map_or(true, |status| status.is_stale)
    }

    // ===== Writes =====

    /// Write `data` under `key`, fresh for `ttl`.
    ///
    /// When the backend is out of space, long-expired entries are swept and
    /// the write is retried once before giving up with
    /// [`CacheError::QuotaExceeded`].
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> Result<(), CacheError> {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        self.write_entry(key, data, ttl)?;

        // An explicit write outranks every fetch already in flight.
        let gens = generations.entry(key.to_string()).or_default();
        gens.issued += 1;
        gens.committed = gens.issued;
        Ok(())
    }

    /// Reserve a generation for a write that will happen after a fetch.
    pub fn begin_write(&self, key: &str) -> WriteTicket {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        let gens = generations.entry(key.to_string()).or_default();
        gens.issued += 1;
        WriteTicket {
            key: key.to_string(),
            generation: gens.issued,
        }
    }

    /// Write the result of a fetch unless a newer one already landed.
    pub fn commit<T: Serialize>(
        &self,
        ticket: &WriteTicket,
        data: &T,
        ttl: Duration,
    ) -> Result<WriteOutcome, CacheError> {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        let committed = generations
            .get(&ticket.key)
            .map_or(0, |gens| gens.committed);

        if ticket.generation < committed {
            debug!(
                key = %ticket.key,
                generation = ticket.generation,
                committed = committed,
                "Discarding result superseded by a newer write"
            );
            return Ok(WriteOutcome::Superseded);
        }

        self.write_entry(&ticket.key, data, ttl)?;
        generations.entry(ticket.key.clone()).or_default().committed = ticket.generation;
        Ok(WriteOutcome::Applied)
    }

    fn write_entry<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(data, self.now(), ttl);
        let contents = serde_json::to_string(&entry).map_err(|source| CacheError::Serialization {
            key: key.to_string(),
            source,
        })?;
        let storage_key = self.storage_key(key);

        match self.backend.set_item(&storage_key, &contents) {
            Ok(()) => {
                debug!(key = key, bytes = contents.len(), "Cached entry");
                Ok(())
            }
            Err(e) if e.is_quota_exceeded() => {
                warn!(key = key, error = %e, "Storage quota exceeded, clearing old cache entries");
                let removed = self.clear_old_cache();

                match self.backend.set_item(&storage_key, &contents) {
                    Ok(()) => {
                        info!(key = key, removed = removed, "Cached entry after eviction");
                        Ok(())
                    }
                    Err(e) if e.is_quota_exceeded() => {
                        warn!(key = key, removed = removed, "Cache write rejected again after eviction");
                        Err(CacheError::QuotaExceeded {
                            key: key.to_string(),
                        })
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    // ===== Eviction =====

    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.backend.remove_item(&self.storage_key(key))?;
        Ok(())
    }

    /// Remove every entry of a keyed family, e.g. all `order_` entries.
    pub fn remove_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut removed = 0;
        for key in self.owned_keys()? {
            if key.starts_with(prefix) {
                self.remove(&key)?;
                removed += 1;
            }
        }
        debug!(prefix = prefix, removed = removed, "Removed cache family");
        Ok(removed)
    }

    pub fn clear_all(&self) -> Result<usize, CacheError> {
        let keys = self.owned_keys()?;
        for key in &keys {
            self.remove(key)?;
        }
        info!(removed = keys.len(), "Cleared cache");
        Ok(keys.len())
    }

    /// Remove entries more than the grace period past their expiry, plus any
    /// that no longer parse. Best effort; returns how many were removed.
    pub fn clear_old_cache(&self) -> usize {
        let keys = match self.owned_keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list cache entries for sweep");
                return 0;
            }
        };

        let now = self.now();
        let mut removed = 0;
        for key in keys {
            let Some(contents) = self.read_raw(&key) else {
                continue;
            };
            let reclaim = match Self::parse::<IgnoredAny>(&key, &contents) {
                Some(entry) => entry.is_reclaimable(now, self.grace_period),
                None => true,
            };
            if !reclaim {
                continue;
            }
            match self.remove(&key) {
                Ok(()) => removed += 1,
                Err(e) => debug!(key = %key, error = %e, "Failed to remove old cache entry"),
            }
        }

        if removed > 0 {
            info!(removed = removed, "Swept old cache entries");
        }
        removed
    }

    // ===== Introspection =====

    /// Approximate bytes held: serialized entries plus their keys.
    pub fn size_bytes(&self) -> usize {
        self.entries().iter().map(|entry| entry.size_bytes).sum()
    }

    pub fn entries(&self) -> Vec<EntrySummary> {
        let keys = match self.owned_keys() {
            Ok(keys) => keys,
            Err(e) => {
                debug!(error = %e, "Failed to list cache entries");
                return Vec::new();
            }
        };

        let now = self.now();
        let mut entries: Vec<EntrySummary> = keys
            .into_iter()
            .filter_map(|key| {
                let contents = self.read_raw(&key)?;
                let status = Self::parse::<IgnoredAny>(&key, &contents).map(|e| e.status(now));
                Some(EntrySummary {
                    size_bytes: self.storage_key(&key).len() + contents.len(),
                    key,
                    status,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

// ============================================================================
// Tests
// ============================================================================
