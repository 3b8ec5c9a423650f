//! Bounded LRU cache.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use super::arena::{Handle, RecencyList};
use crate::types::responses::CacheStats;

/// Index and recency order, always mutated together under one lock.
struct LruState<K, V> {
    index: HashMap<K, Handle>,
    order: RecencyList<K, V>,
}

/// Capacity-limited key/value store with least-recently-used eviction.
///
/// Every operation takes the same exclusive lock over the hash index and the
/// recency list, and every operation is O(1) apart from [`keys`](Self::keys).
/// Nothing here blocks on I/O, so the lock is never held while a payload is
/// being produced.
///
/// A cache built with capacity zero retains nothing: [`set`](Self::set) is a
/// no-op and [`get`](Self::get) always misses.
pub struct BoundedCache<K, V> {
    state: Mutex<LruState<K, V>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
{
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(LruState {
                index: HashMap::with_capacity(capacity),
                order: RecencyList::with_capacity(capacity),
            }),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Looks up `key`, promoting it to most recently used on a hit.
    ///
    /// A miss leaves the recency order untouched.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = {
            let mut state = self.state.lock();
            match state.index.get(key).copied() {
                Some(handle) => {
                    state.order.move_to_front(handle);
                    Some(state.order.value(handle).clone())
                }
                None => None,
            }
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Reads `key` without touching its recency or the hit counters.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let state = self.state.lock();
        state
            .index
            .get(key)
            .map(|&handle| state.order.value(handle).clone())
    }

    /// Returns true if `key` is cached. Does not promote it.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.state.lock().index.contains_key(key)
    }

    /// Associates `value` with `key` and makes it the most recently used entry.
    ///
    /// Replacing an existing key never evicts. Inserting a new key into a
    /// full cache first evicts the least recently used entry.
    pub fn set(&self, key: K, value: V) {
        if self.capacity == 0 {
            trace!(key = ?key, "zero-capacity cache, not storing");
            return;
        }

        let mut state = self.state.lock();

        if let Some(handle) = state.index.get(&key).copied() {
            *state.order.value_mut(handle) = value;
            state.order.move_to_front(handle);
            trace!(key = ?key, "updated cache entry");
            return;
        }

        if state.order.len() >= self.capacity {
            if let Some((evicted, _)) = state.order.pop_back() {
                state.index.remove(&evicted);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                trace!(key = ?evicted, "evicted least recently used entry");
            }
        }

        let handle = state.order.push_front(key.clone(), value);
        trace!(key = ?key, "added cache entry");
        state.index.insert(key, handle);

        debug_assert_eq!(state.index.len(), state.order.len());
        debug_assert!(state.index.len() <= self.capacity);
    }

    /// Removes `key`, returning its value if it was cached.
    pub fn invalidate<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.state.lock();
        let handle = state.index.remove(key)?;
        let (_, value) = state.order.remove(handle);
        Some(value)
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.index.clear();
        state.order.clear();
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.state.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the cached keys, most recently used first.
    pub fn keys(&self) -> Vec<K> {
        let state = self.state.lock();
        state.order.iter().map(|(_, key, _)| key.clone()).collect()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .field("len", &self.state.lock().order.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> BoundedCache<String, String> {
        BoundedCache::new(capacity)
    }

    fn set(cache: &BoundedCache<String, String>, key: &str, value: &str) {
        cache.set(key.to_string(), value.to_string());
    }

    /// Checks the index/order bijection and the capacity bound.
    fn assert_consistent<K, V>(cache: &BoundedCache<K, V>)
    where
        K: Hash + Eq + Clone + Debug,
        V: Clone,
    {
        let state = cache.state.lock();
        assert_eq!(state.index.len(), state.order.len());
        assert!(state.index.len() <= cache.capacity);

        let mut walked = 0;
        for (handle, key, _) in state.order.iter() {
            assert_eq!(state.index.get(key), Some(&handle));
            walked += 1;
        }
        assert_eq!(walked, state.index.len());

        for (key, &handle) in &state.index {
            assert_eq!(state.order.key(handle), key);
        }
    }

    #[test]
    fn test_cache_hit() {
        let cache = cache(10);
        set(&cache, "ls", "list directory contents");

        assert_eq!(cache.get("ls").as_deref(), Some("list directory contents"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cache_miss() {
        let cache = cache(10);

        assert!(cache.get("nonexistent").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_lru_eviction_of_first_inserted() {
        let cache = cache(3);
        for key in ["k1", "k2", "k3", "k4"] {
            set(&cache, key, key);
            assert!(cache.len() <= 3);
        }

        assert!(cache.get("k1").is_none());
        for key in ["k2", "k3", "k4"] {
            assert_eq!(cache.get(key).as_deref(), Some(key));
        }
        assert_eq!(cache.stats().evictions, 1);
        assert_consistent(&cache);
    }

    #[test]
    fn test_read_promotes_entry() {
        let cache = cache(2);
        set(&cache, "k1", "v1");
        set(&cache, "k2", "v2");

        assert!(cache.get("k1").is_some());
        set(&cache, "k3", "v3");

        assert!(cache.get("k2").is_none());
        assert!(cache.get("k1").is_some());
        assert!(cache.get("k3").is_some());
        assert_consistent(&cache);
    }

    #[test]
    fn test_update_replaces_payload_without_growing() {
        let cache = cache(2);
        set(&cache, "k", "v1");
        set(&cache, "other", "x");
        set(&cache, "k", "v2");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("k").as_deref(), Some("v2"));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_update_promotes_entry() {
        let cache = cache(2);
        set(&cache, "k1", "v1");
        set(&cache, "k2", "v2");
        set(&cache, "k1", "v1b");
        set(&cache, "k3", "v3");

        assert_eq!(cache.keys(), vec!["k3".to_string(), "k1".to_string()]);
    }

    #[test]
    fn test_repeated_get_only_changes_recency() {
        let cache = cache(3);
        set(&cache, "a", "1");
        set(&cache, "b", "2");
        set(&cache, "c", "3");

        for _ in 0..5 {
            assert_eq!(cache.get("a").as_deref(), Some("1"));
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(
            cache.keys(),
            vec!["a".to_string(), "c".to_string(), "b".to_string()]
        );
        assert_consistent(&cache);
    }

    #[test]
    fn test_miss_does_not_mutate() {
        let cache = cache(3);
        set(&cache, "a", "1");
        set(&cache, "b", "2");
        let before = cache.keys();

        assert!(cache.get("zzz").is_none());

        assert_eq!(cache.keys(), before);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let cache = cache(0);
        set(&cache, "k", "v");

        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().evictions, 0);
        assert_consistent(&cache);
    }

    #[test]
    fn test_capacity_one() {
        let cache = cache(1);
        set(&cache, "a", "1");
        set(&cache, "b", "2");

        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b").as_deref(), Some("2"));
        assert_consistent(&cache);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let cache = cache(2);
        set(&cache, "k1", "v1");
        set(&cache, "k2", "v2");

        assert_eq!(cache.peek("k1").as_deref(), Some("v1"));
        assert!(cache.contains("k1"));
        set(&cache, "k3", "v3");

        assert!(!cache.contains("k1"));
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_invalidate() {
        let cache = cache(10);
        set(&cache, "k", "v");

        assert_eq!(cache.invalidate("k").as_deref(), Some("v"));
        assert!(cache.invalidate("k").is_none());
        assert!(cache.get("k").is_none());
        assert_consistent(&cache);
    }

    #[test]
    fn test_invalidate_frees_room() {
        let cache = cache(2);
        set(&cache, "a", "1");
        set(&cache, "b", "2");
        cache.invalidate("a");
        set(&cache, "c", "3");

        assert_eq!(cache.stats().evictions, 0);
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_clear() {
        let cache = cache(10);
        set(&cache, "key1", "a");
        set(&cache, "key2", "b");

        cache.clear();

        assert!(cache.get("key1").is_none());
        assert!(cache.get("key2").is_none());
        assert_eq!(cache.stats().size, 0);
        assert_consistent(&cache);
    }

    #[test]
    fn test_cache_stats() {
        let cache = cache(10);
        set(&cache, "key1", "a");

        cache.get("key1"); // Hit
        cache.get("key2"); // Miss
        cache.get("key1"); // Hit

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_capacity_holds_for_long_sequences() {
        let cache: BoundedCache<u32, u32> = BoundedCache::new(7);
        for i in 0..500u32 {
            cache.set(i % 23, i);
            if i % 3 == 0 {
                cache.get(&(i % 11));
            }
            assert!(cache.len() <= 7);
        }
        assert_consistent(&cache);
    }

    #[test]
    fn test_concurrent_access_keeps_invariants() {
        let cache: BoundedCache<u32, u64> = BoundedCache::new(16);

        std::thread::scope(|scope| {
            for t in 0..8u64 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..2_000u64 {
                        let key = ((t * 31 + i * 17) % 64) as u32;
                        if i % 2 == 0 {
                            cache.set(key, i);
                        } else {
                            cache.get(&key);
                        }
                    }
                });
            }
        });

        assert!(cache.len() <= 16);
        assert_consistent(&cache);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8 * 1_000);
    }
}
