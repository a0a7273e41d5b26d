//! # Memory Tier
//!
//! Bounded LRU map of deserialized values. Two independent limits apply:
//! the number of entries and the summed cost of all entries, where the cost
//! of an entry is the byte length of its serialized form. Inserting past
//! either limit evicts least-recently-used entries until both hold again.

use crate::config::MemoryConfig;
use crate::stats::MemoryStats;
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;

struct Entry<V> {
    value: V,
    cost: usize,
    expires_at: Option<DateTime<Utc>>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    total_cost: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K: Hash + Eq, V> Inner<K, V> {
    fn drop_entry(&mut self, entry: &Entry<V>) {
        self.total_cost = self.total_cost.saturating_sub(entry.cost);
    }
}

/// In-memory LRU tier.
pub struct MemoryTier<K: Hash + Eq, V> {
    config: MemoryConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> MemoryTier<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create an empty tier. A zero count limit is treated as one.
    pub fn new(config: MemoryConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(config.count_limit).unwrap_or(NonZeroUsize::MIN);

        Self {
            config,
            clock,
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                total_cost: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Insert using the tier's own expiry policy.
    ///
    /// Returns the number of other entries evicted to make room.
    pub fn insert(&self, key: K, value: V, cost: usize) -> usize {
        let expires_at = self.config.expiry.expires_at(self.clock.now());
        self.insert_with_expiry(key, value, cost, expires_at)
    }

    /// Insert with an explicit expiry instant (used when promoting disk
    /// entries, which keep the expiry they were written with).
    ///
    /// An entry whose cost alone exceeds the cost limit is not stored; any
    /// previous value under the same key is dropped instead.
    pub fn insert_with_expiry(
        &self,
        key: K,
        value: V,
        cost: usize,
        expires_at: Option<DateTime<Utc>>,
    ) -> usize {
        let mut inner = self.inner.lock();
        self.insert_locked(&mut inner, key, value, cost, expires_at)
    }

    /// Insert only when no live entry exists under `key`. Returns whether
    /// the value was stored.
    ///
    /// Used for promotions from disk, which must never replace a value
    /// written after the disk read.
    pub fn insert_if_absent(
        &self,
        key: K,
        value: V,
        cost: usize,
        expires_at: Option<DateTime<Utc>>,
    ) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner
            .entries
            .peek(&key)
            .is_some_and(|entry| !entry.is_expired(now))
        {
            return false;
        }
        if cost > self.config.total_cost_limit {
            return false;
        }
        self.insert_locked(&mut inner, key, value, cost, expires_at);
        true
    }

    fn insert_locked(
        &self,
        inner: &mut Inner<K, V>,
        key: K,
        value: V,
        cost: usize,
        expires_at: Option<DateTime<Utc>>,
    ) -> usize {
        if cost > self.config.total_cost_limit {
            if let Some(previous) = inner.entries.pop(&key) {
                inner.drop_entry(&previous);
            }
            trace!(cost, limit = self.config.total_cost_limit, "Entry exceeds memory cost limit");
            return 0;
        }

        let replacing = inner.entries.contains(&key);
        let mut evicted = 0;

        let entry = Entry {
            value,
            cost,
            expires_at,
        };
        // `push` hands back either the replaced value or the evicted LRU entry.
        if let Some((_, displaced)) = inner.entries.push(key, entry) {
            inner.drop_entry(&displaced);
            if !replacing {
                evicted += 1;
            }
        }
        inner.total_cost += cost;

        while inner.total_cost > self.config.total_cost_limit {
            match inner.entries.pop_lru() {
                Some((_, lru)) => {
                    inner.drop_entry(&lru);
                    evicted += 1;
                }
                None => break,
            }
        }

        inner.evictions += evicted as u64;
        evicted
    }

    /// Look up a value, marking it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                inner.hits += 1;
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            if let Some(entry) = inner.entries.pop(key) {
                inner.drop_entry(&entry);
                inner.evictions += 1;
            }
        }
        inner.misses += 1;
        None
    }

    /// Whether a live entry exists, without touching recency.
    pub fn contains(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.inner
            .lock()
            .entries
            .peek(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.pop(key)?;
        inner.drop_entry(&entry);
        Some(entry.value)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.total_cost = 0;
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn remove_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let mut expired_costs = Vec::new();
        let mut kept = LruCache::new(inner.entries.cap());
        // Oldest first so `kept` ends up in the same recency order.
        while let Some((key, entry)) = inner.entries.pop_lru() {
            if entry.is_expired(now) {
                expired_costs.push(entry.cost);
            } else {
                kept.push(key, entry);
            }
        }
        inner.entries = kept;

        let removed = expired_costs.len();
        inner.total_cost = inner
            .total_cost
            .saturating_sub(expired_costs.into_iter().sum());
        inner.evictions += removed as u64;
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_cost(&self) -> usize {
        self.inner.lock().total_cost
    }

    pub fn stats(&self) -> MemoryStats {
        let inner = self.inner.lock();
        MemoryStats {
            entries: inner.entries.len(),
            total_cost: inner.total_cost,
            count_limit: self.config.count_limit,
            total_cost_limit: self.config.total_cost_limit,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}
