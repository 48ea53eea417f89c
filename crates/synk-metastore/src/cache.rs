//! In-memory metadata cache
//!
//! Holds encoded data strings keyed by [`CacheKey`]. The cache is bounded
//! by entry count and internally synchronized, so the store can share it
//! across callers without an outer lock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use synk_common::CacheKey;

/// Capacity-bounded map the metadata store caches data strings in
pub trait MemCache: Send + Sync {
    /// Look up a data string
    fn get(&self, key: &CacheKey) -> Option<String>;

    /// Insert or replace, evicting another entry if at capacity
    fn put(&self, key: CacheKey, data: String);

    /// Remove an entry
    fn remove(&self, key: &CacheKey) -> Option<String>;

    /// Maximum number of entries held at once
    fn max_size(&self) -> usize;

    /// Current number of entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Individual cache entry with LRU tracking
struct CacheEntry {
    data: String,
    /// Last access time for LRU eviction
    last_access: AtomicU64,
}

impl CacheEntry {
    const fn new(data: String, clock: u64) -> Self {
        Self {
            data,
            last_access: AtomicU64::new(clock),
        }
    }

    fn touch(&self, clock: u64) {
        self.last_access.store(clock, Ordering::Relaxed);
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: AtomicU64,
    /// Number of cache misses
    pub misses: AtomicU64,
    /// Number of entries evicted
    pub evictions: AtomicU64,
}

impl CacheStats {
    /// Calculate hit ratio (0.0 to 1.0)
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }

    /// Reset all statistics
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

/// LRU cache ordered by a logical access clock
pub struct LruCache {
    /// Cached entries protected by RwLock
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    max_entries: usize,
    /// Logical clock for LRU ordering
    clock: AtomicU64,
    stats: CacheStats,
}

impl LruCache {
    /// Create a cache holding at most `max_entries` entries (at least one)
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            clock: AtomicU64::new(0),
            stats: CacheStats::default(),
        }
    }

    /// Get cache statistics
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Check if a key is cached without touching its LRU position
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Advance the logical clock and return the new value
    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn find_lru_entry(entries: &HashMap<CacheKey, CacheEntry>) -> Option<CacheKey> {
        entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access.load(Ordering::Relaxed))
            .map(|(key, _)| *key)
    }
}

impl MemCache for LruCache {
    fn get(&self, key: &CacheKey) -> Option<String> {
        let entries = self.entries.read();
        if let Some(entry) = entries.get(key) {
            entry.touch(self.tick());
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            Some(entry.data.clone())
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    fn put(&self, key: CacheKey, data: String) {
        let clock = self.tick();
        let mut entries = self.entries.write();

        // Replacing an entry never needs room
        if let Some(entry) = entries.get_mut(&key) {
            entry.data = data;
            entry.touch(clock);
            return;
        }

        while entries.len() >= self.max_entries {
            let Some(evict_key) = Self::find_lru_entry(&entries) else {
                break;
            };
            entries.remove(&evict_key);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }

        entries.insert(key, CacheEntry::new(data, clock));
    }

    fn remove(&self, key: &CacheKey) -> Option<String> {
        self.entries.write().remove(key).map(|entry| entry.data)
    }

    fn max_size(&self) -> usize {
        self.max_entries
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
