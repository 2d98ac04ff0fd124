//! Cache Store Module
//!
//! Single-threaded cache engine combining HashMap storage with LRU tracking
//! and TTL expiration. [`BoundedExpiringCache`](super::BoundedExpiringCache)
//! wraps it for shared use.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, LruTracker};
use crate::config::CacheConfig;
use crate::error::Result;

// == Cache Store ==
/// Cache storage with LRU eviction and TTL support.
///
/// Capacity is enforced on insert, expiry is enforced on read. An expired
/// entry that nobody has read yet still occupies a slot and can be picked as
/// the eviction victim.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Lifetime of every inserted entry
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore after validating `config`.
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity: config.capacity,
            ttl: config.ttl,
            clock,
        })
    }

    // == Set ==
    /// Stores a value under `key`.
    ///
    /// An existing entry is overwritten and its TTL restarts. A new key
    /// arriving at capacity first evicts the least recently used entry.
    pub fn set(&mut self, key: String, value: V) {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.recency_rank = self.lru.touch(&key, Some(entry.recency_rank));
            entry.value = value;
            entry.expires_at = now + self.ttl;
            return;
        }

        if self.entries.len() >= self.capacity {
            if let Some(evicted_key) = self.lru.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
                debug!(key = %evicted_key, "evicted least recently used entry");
            }
        }

        let rank = self.lru.touch(&key, None);
        self.entries
            .insert(key, CacheEntry::new(value, now, self.ttl, rank));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a clone of the value stored under `key`.
    ///
    /// A hit promotes the entry to most recently used. An expired entry is
    /// dropped and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now();

        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.record_miss();
            return None;
        };

        if entry.is_expired(now) {
            let rank = entry.recency_rank;
            self.entries.remove(key);
            self.lru.remove(rank);
            self.stats.record_miss();
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
            debug!(key, "dropped expired entry on read");
            return None;
        }

        entry.recency_rank = self.lru.touch(key, Some(entry.recency_rank));
        self.stats.record_hit();
        Some(entry.value.clone())
    }

    // == Delete ==
    /// Removes the entry stored under `key`. Returns whether one existed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.lru.remove(entry.recency_rank);
                self.stats.set_total_entries(self.entries.len());
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Drops every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let lru = &mut self.lru;
        let before = self.entries.len();

        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                lru.remove(entry.recency_rank);
            }
            keep
        });

        let removed = before - self.entries.len();
        self.stats.record_expirations(removed as u64);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }
}

impl<V> CacheStore<V> {
    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
