//! Integration tests for the bounded LRU cache.

use std::sync::Arc;
use std::thread;

use lookaside::BoundedCache;

#[test]
fn test_least_recently_used_is_evicted() {
    let cache = BoundedCache::new(2);
    cache.set("a", 1);
    cache.set("b", 2);

    // Touching "a" makes "b" the eviction candidate
    assert_eq!(cache.get("a"), Some(1));
    cache.set("c", 3);

    assert_eq!(cache.get("b"), None);
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("c"), Some(3));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_overwrite_does_not_evict() {
    let cache = BoundedCache::new(2);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("a", 10);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.keys(), vec!["a", "b"]);
    assert_eq!(cache.get("a"), Some(10));
    assert_eq!(cache.stats().evictions, 0);
}

#[test]
fn test_capacity_one() {
    let cache = BoundedCache::new(1);
    cache.set("a", 1);
    cache.set("b", 2);

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(2));
}

#[test]
fn test_zero_capacity_retains_nothing() {
    let cache = BoundedCache::new(0);
    cache.set("a", 1);

    assert!(cache.is_empty());
    assert_eq!(cache.get("a"), None);

    let stats = cache.stats();
    assert_eq!(stats.capacity, 0);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.evictions, 0);
}

#[test]
fn test_invalidate_and_clear() {
    let cache = BoundedCache::new(3);
    cache.set("a".to_string(), "x".to_string());
    cache.set("b".to_string(), "y".to_string());

    assert_eq!(cache.invalidate("a"), Some("x".to_string()));
    assert_eq!(cache.invalidate("a"), None);
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());

    // Still usable after clear
    cache.set("c".to_string(), "z".to_string());
    assert_eq!(cache.get("c"), Some("z".to_string()));
}

#[test]
fn test_peek_does_not_promote() {
    let cache = BoundedCache::new(2);
    cache.set("a", 1);
    cache.set("b", 2);

    assert_eq!(cache.peek("a"), Some(1));
    cache.set("c", 3);

    assert!(!cache.contains("a"));
    assert!(cache.contains("b"));
}

#[test]
fn test_concurrent_writers_respect_capacity() {
    let cache = Arc::new(BoundedCache::new(16));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..1_000u32 {
                    let key = (t * 31 + i) % 64;
                    if cache.get(&key).is_none() {
                        cache.set(key, key * 2);
                    }
                    assert!(cache.len() <= 16);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.len() <= 16);
    for key in cache.keys() {
        assert_eq!(cache.peek(&key), Some(key * 2));
    }

    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, 8_000);
}
