//! Generic time-to-live cache for market snapshots.
//!
//! Entries expire strictly once their elapsed time since insertion reaches
//! the TTL; an expired entry behaves as a miss and is removed lazily on read.
//! Distinct TTLs per call let market-list caching (minutes) and book/price
//! caching (seconds) share one implementation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired_at(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// Thread-safe TTL key/value store.
///
/// Writes replace entries atomically; concurrent population of the same key
/// converges last-write-wins.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a live value, treating expired entries as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
                None => return None,
                Some(_) => {}
            }
        }

        // Expired: evict lazily, re-checking under the write lock in case a
        // concurrent put already replaced the entry.
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(key) {
            if entry.is_expired_at(now) {
                entries.remove(key);
            } else {
                return Some(entry.value.clone());
            }
        }
        None
    }

    /// Insert a value with its own TTL, replacing any existing entry.
    pub fn put(&self, key: &str, value: V, ttl: Duration) {
        self.put_at(key, value, ttl, Instant::now());
    }

    fn put_at(&self, key: &str, value: V, ttl: Duration, now: Instant) {
        self.entries.write().insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: now,
                ttl,
            },
        );
    }

    /// Remove a single entry. Returns true if one was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries, including not-yet-evicted expired ones.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cache = TtlCache::new();
        cache.put("k", 42u32, Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(42));
    }

    #[test]
    fn test_missing_key() {
        let cache: TtlCache<u32> = TtlCache::new();
        assert_eq!(cache.get("absent"), None);
    }

    #[test]
    fn test_expiry_is_a_miss_and_evicts() {
        let cache = TtlCache::new();
        let t0 = Instant::now();
        cache.put_at("k", 42u32, Duration::from_secs(30), t0);

        // Just before the TTL the entry is live.
        assert_eq!(cache.get_at("k", t0 + Duration::from_secs(29)), Some(42));
        // At exactly the TTL it expires and is removed.
        assert_eq!(cache.get_at("k", t0 + Duration::from_secs(30)), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_per_key_ttls_coexist() {
        let cache = TtlCache::new();
        let t0 = Instant::now();
        cache.put_at("markets", 1u32, Duration::from_secs(300), t0);
        cache.put_at("book", 2u32, Duration::from_secs(2), t0);

        let later = t0 + Duration::from_secs(10);
        assert_eq!(cache.get_at("markets", later), Some(1));
        assert_eq!(cache.get_at("book", later), None);
    }

    #[test]
    fn test_put_replaces_and_resets_ttl() {
        let cache = TtlCache::new();
        let t0 = Instant::now();
        cache.put_at("k", 1u32, Duration::from_secs(10), t0);
        cache.put_at("k", 2u32, Duration::from_secs(10), t0 + Duration::from_secs(8));

        assert_eq!(cache.get_at("k", t0 + Duration::from_secs(15)), Some(2));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = TtlCache::new();
        cache.put("a", 1u32, Duration::from_secs(60));
        cache.put("b", 2u32, Duration::from_secs(60));

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.get("a"), None);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_concurrent_population_converges() {
        use std::sync::Arc;

        let cache = Arc::new(TtlCache::new());
        let mut handles = Vec::new();
        for i in 0..8u32 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    cache.put("k", i, Duration::from_secs(60));
                    let _ = cache.get("k");
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Some writer won; the entry is intact and readable.
        assert!(cache.get("k").is_some());
        assert_eq!(cache.len(), 1);
    }
}
