//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::BTreeMap;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch hands out a fresh, strictly increasing rank. Keys are indexed
/// by rank, so the smallest rank is the least recently used key and touching
/// or removing a key costs `O(log n)`.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Keys ordered by rank
    order: BTreeMap<u64, String>,
    /// Rank handed out by the next touch
    next_rank: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used and returns its new rank.
    ///
    /// `previous` is the rank the key held before, if it was tracked.
    pub fn touch(&mut self, key: &str, previous: Option<u64>) -> u64 {
        if let Some(rank) = previous {
            self.order.remove(&rank);
        }
        let rank = self.next_rank;
        self.next_rank += 1;
        self.order.insert(rank, key.to_string());
        rank
    }

    // == Remove ==
    /// Stops tracking the key held at `rank`.
    pub fn remove(&mut self, rank: u64) {
        self.order.remove(&rank);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_first().map(|(_, key)| key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.first_key_value().map(|(_, key)| key)
    }

    // == Clear ==
    /// Forgets every tracked key. Ranks keep increasing.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
