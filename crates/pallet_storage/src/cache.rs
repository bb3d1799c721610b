#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use pallet_contracts::MonotonicTimeNs;
use tracing::debug;

pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CacheEntry<K, V> {
    key: K,
    value: Arc<V>,
    expires_at: MonotonicTimeNs,
}

/// Single-slot time-bounded cache.
///
/// The slot is overwritten on every miss. The lock is not held while loading,
/// so two callers that miss at the same time both load and the later one wins
/// the slot.
#[derive(Debug)]
pub struct SnapshotCache<K, V> {
    slot: Mutex<Option<CacheEntry<K, V>>>,
}

impl<K, V> Default for SnapshotCache<K, V> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<K: Clone + PartialEq, V> SnapshotCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load<F>(&self, key: &K, ttl: Duration, now: MonotonicTimeNs, load: F) -> Arc<V>
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(value) = self.peek(key, now) {
            debug!("snapshot cache hit");
            return value;
        }

        debug!(ttl_secs = ttl.as_secs(), "snapshot cache miss, loading");
        let value = Arc::new(load(key));
        let entry = CacheEntry {
            key: key.clone(),
            value: value.clone(),
            expires_at: now.saturating_add(ttl),
        };
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(entry);
        value
    }

    /// Returns the cached value only while it is fresh for `key`.
    pub fn peek(&self, key: &K, now: MonotonicTimeNs) -> Option<Arc<V>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(entry) if entry.key == *key && now < entry.expires_at => {
                Some(entry.value.clone())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const TTL: Duration = Duration::from_secs(300);

    fn at_secs(s: u64) -> MonotonicTimeNs {
        MonotonicTimeNs(s * 1_000_000_000)
    }

    #[test]
    fn at_cache_01_loads_once_within_ttl() {
        let cache: SnapshotCache<&str, u32> = SnapshotCache::new();
        let calls = Cell::new(0);
        let load = |_: &&str| {
            calls.set(calls.get() + 1);
            7
        };

        assert_eq!(*cache.get_or_load(&"files", TTL, at_secs(0), load), 7);
        assert_eq!(*cache.get_or_load(&"files", TTL, at_secs(299), load), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn at_cache_02_reloads_after_expiry() {
        let cache: SnapshotCache<&str, u32> = SnapshotCache::new();
        let calls = Cell::new(0);
        let load = |_: &&str| {
            calls.set(calls.get() + 1);
            calls.get()
        };

        assert_eq!(*cache.get_or_load(&"files", TTL, at_secs(0), load), 1);
        assert_eq!(*cache.get_or_load(&"files", TTL, at_secs(300), load), 2);
        assert_eq!(*cache.get_or_load(&"files", TTL, at_secs(301), load), 2);
    }

    #[test]
    fn at_cache_03_different_key_replaces_slot() {
        let cache: SnapshotCache<&str, &str> = SnapshotCache::new();
        assert_eq!(*cache.get_or_load(&"a", TTL, at_secs(0), |_| "from a"), "from a");
        assert_eq!(*cache.get_or_load(&"b", TTL, at_secs(1), |_| "from b"), "from b");
        assert!(cache.peek(&"a", at_secs(2)).is_none());
        assert_eq!(cache.peek(&"b", at_secs(2)).as_deref(), Some(&"from b"));
    }

    #[test]
    fn at_cache_04_shared_across_threads() {
        let cache: Arc<SnapshotCache<u8, String>> = Arc::new(SnapshotCache::new());
        cache.get_or_load(&0, TTL, at_secs(0), |_| "warm".to_string());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    cache
                        .get_or_load(&0, TTL, at_secs(1), |_| "cold".to_string())
                        .to_string()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "warm");
        }
    }
}
