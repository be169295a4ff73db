//! Bounded in-memory TTL cache backed by `DashMap`.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A single cached value with its expiration time.
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe in-memory cache with time-to-live expiration and a size cap.
///
/// Expired entries are evicted on the next `get` for that key. When an
/// insert would exceed the capacity, expired entries are purged first and
/// then the entry closest to expiry is dropped.
pub struct MemoryCache<V> {
    store: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> MemoryCache<V> {
    /// Creates a cache holding at most `capacity` entries (minimum 1) for
    /// `ttl` each.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Returns the cached value for `key`, or `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.store.get(key)?;
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Inserts or overwrites a cache entry. The entry expires after the configured TTL.
    pub fn set(&self, key: String, value: V) {
        if !self.store.contains_key(&key) && self.store.len() >= self.capacity {
            self.make_room();
        }
        self.store.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn make_room(&self) {
        let now = Instant::now();
        self.store.retain(|_, entry| entry.expires_at > now);
        if self.store.len() < self.capacity {
            return;
        }
        let oldest = self
            .store
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.store.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> MemoryCache<String> {
        MemoryCache::new(Duration::from_secs(60), capacity)
    }

    #[test]
    fn cache_set_and_get() {
        let cache = cache(8);
        cache.set("key1".to_string(), "value1".to_string());
        assert_eq!(cache.get("key1"), Some("value1".to_string()));
    }

    #[test]
    fn cache_miss() {
        assert_eq!(cache(8).get("nonexistent"), None);
    }

    #[test]
    fn cache_expiration_evicts_on_read() {
        let cache = MemoryCache::new(Duration::from_millis(1), 8);
        cache.set("key1".to_string(), "value1".to_string());
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get("key1"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_overwrite() {
        let cache = cache(1);
        cache.set("key1".to_string(), "old".to_string());
        cache.set("key1".to_string(), "new".to_string());
        assert_eq!(cache.get("key1"), Some("new".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn capacity_evicts_nearest_expiry() {
        let cache = cache(2);
        cache.set("a".to_string(), "1".to_string());
        std::thread::sleep(Duration::from_millis(2));
        cache.set("b".to_string(), "2".to_string());
        std::thread::sleep(Duration::from_millis(2));
        cache.set("c".to_string(), "3".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some("2".to_string()));
        assert_eq!(cache.get("c"), Some("3".to_string()));
    }

    #[test]
    fn capacity_prefers_dropping_expired() {
        let cache = MemoryCache::new(Duration::from_millis(5), 2);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        std::thread::sleep(Duration::from_millis(10));
        cache.set("c".to_string(), 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("c"), Some(3));
    }
}
