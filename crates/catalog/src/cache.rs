//! Time-bounded concurrent cache.
//!
//! Entries are stored as value and timestamp together in one `DashMap` slot,
//! so a concurrent reader never observes a value paired with another write's
//! timestamp. Timestamps come from `tokio::time::Instant` so tests can drive
//! expiry with a paused clock.

use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// A map whose entries stop being returned once `ttl` has elapsed since they
/// were stored
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any. Stale entries are left in place for
    /// [`evict_expired`](Self::evict_expired) or the next `put`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Store `value` with a fresh timestamp
    pub fn put(&self, key: K, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every stale entry; returns how many were removed
    pub fn evict_expired(&self) -> usize {
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let fresh = entry.is_fresh(self.ttl);
            if !fresh {
                evicted += 1;
            }
            fresh
        });
        evicted
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put(1u64, "one".to_string());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&1), Some("one".to_string()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&1), None);
        // Still stored until evicted
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_refreshes_timestamp() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.put("k", 1);
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put("k", 2);
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get(&"k"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired_keeps_fresh_entries() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.put(1u32, 'a');
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.put(2u32, 'b');
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&2), Some('b'));
        assert_eq!(cache.evict_expired(), 0);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_and_sweeper() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(300)));

        let mut handles = Vec::new();
        for worker in 0..4u64 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for i in 0..250u64 {
                    let key = worker * 1000 + i;
                    cache.put(key, key * 2);
                    assert_eq!(cache.get(&key), Some(key * 2));
                    if i % 50 == 0 {
                        cache.evict_expired();
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 1000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_eviction_count_ignores_concurrent_puts() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(1)));
        for key in 0..500u64 {
            cache.put(key, key);
        }
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let writer = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for key in 1000..3000u64 {
                    cache.put(key, key);
                }
            })
        };
        let evicted = cache.evict_expired();
        writer.await.unwrap();

        // Only the 500 stale entries count, whatever the writer inserted
        assert_eq!(evicted, 500);
    }
}
