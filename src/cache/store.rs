//! Cache storage.
//!
//! [`WorkerCache`] is the seam the consistency layer talks to; [`L0WorkerCache`]
//! is the in-process LRU implementation.

use std::sync::RwLock;

use lru::LruCache;
use metrics::counter;

use crate::domain::WorkerRecord;

use super::config::CacheConfig;
use super::keys::WorkerCacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";
const METRIC_CACHE_HIT: &str = "worker_cookies_cache_hit_total";
const METRIC_CACHE_MISS: &str = "worker_cookies_cache_miss_total";
const METRIC_CACHE_EVICT: &str = "worker_cookies_cache_evict_total";

/// Outcome of a durable lookup as remembered by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedLookup {
    Found(WorkerRecord),
    /// The uuid was looked up and had no record.
    Missing,
}

impl CachedLookup {
    pub fn into_record(self) -> Option<WorkerRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::Missing => None,
        }
    }
}

impl From<Option<WorkerRecord>> for CachedLookup {
    fn from(value: Option<WorkerRecord>) -> Self {
        value.map_or(Self::Missing, Self::Found)
    }
}

/// Shared cache of worker lookups.
///
/// Implementations give no ordering or atomicity across calls; callers
/// serialize per key with [`super::KeyLocks`].
pub trait WorkerCache: Send + Sync {
    /// `None` means never looked up (or evicted), not "no such worker".
    fn get(&self, key: &WorkerCacheKey) -> Option<CachedLookup>;

    /// Like [`WorkerCache::get`], but neither counted as a hit or miss nor
    /// promoted in recency. For re-checks by a caller already holding the key.
    fn peek(&self, key: &WorkerCacheKey) -> Option<CachedLookup>;

    fn put(&self, key: WorkerCacheKey, value: CachedLookup);

    fn remove(&self, key: &WorkerCacheKey);
}

/// LRU-bounded in-memory worker cache.
pub struct L0WorkerCache {
    entries: RwLock<LruCache<WorkerCacheKey, CachedLookup>>,
}

impl L0WorkerCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }
}

impl WorkerCache for L0WorkerCache {
    fn get(&self, key: &WorkerCacheKey) -> Option<CachedLookup> {
        // LRU promotion mutates, so reads take the write lock.
        let cached = rw_write(&self.entries, SOURCE, "get").get(key).cloned();
        match cached {
            Some(_) => counter!(METRIC_CACHE_HIT).increment(1),
            None => counter!(METRIC_CACHE_MISS).increment(1),
        }
        cached
    }

    fn peek(&self, key: &WorkerCacheKey) -> Option<CachedLookup> {
        rw_read(&self.entries, SOURCE, "peek").peek(key).cloned()
    }

    fn put(&self, key: WorkerCacheKey, value: CachedLookup) {
        let evicted = rw_write(&self.entries, SOURCE, "put").push(key.clone(), value);
        // `push` also hands back the old value when overwriting the same key.
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            counter!(METRIC_CACHE_EVICT).increment(1);
        }
    }

    fn remove(&self, key: &WorkerCacheKey) {
        rw_write(&self.entries, SOURCE, "remove").pop(key);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::domain::WorkerIdentity;

    fn sample_record(uuid: &str) -> WorkerRecord {
        WorkerRecord::new(&WorkerIdentity::new(uuid, "host", "10.1.1.1"), "cookie")
    }

    #[test]
    fn negative_lookup_is_distinct_from_absent_entry() {
        let cache = L0WorkerCache::new(&CacheConfig::default());
        let key = WorkerCacheKey::for_uuid("ghost");

        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), CachedLookup::Missing);
        assert_eq!(cache.get(&key), Some(CachedLookup::Missing));

        cache.remove(&key);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn found_entry_returns_snapshot() {
        let cache = L0WorkerCache::new(&CacheConfig::default());
        let key = WorkerCacheKey::for_uuid("w1");
        cache.put(key.clone(), CachedLookup::Found(sample_record("w1")));

        let record = cache
            .get(&key)
            .and_then(CachedLookup::into_record)
            .expect("cached record");
        assert_eq!(record.uuid(), "w1");
    }

    #[test]
    fn peek_does_not_refresh_recency() {
        let config = CacheConfig {
            capacity: 2,
            ..Default::default()
        };
        let cache = L0WorkerCache::new(&config);
        let first = WorkerCacheKey::for_uuid("w1");
        let second = WorkerCacheKey::for_uuid("w2");

        cache.put(first.clone(), CachedLookup::Missing);
        cache.put(second.clone(), CachedLookup::Missing);
        assert_eq!(cache.peek(&first), Some(CachedLookup::Missing));

        cache.put(WorkerCacheKey::for_uuid("w3"), CachedLookup::Missing);
        assert!(cache.peek(&first).is_none());
        assert!(cache.peek(&second).is_some());
    }

    #[test]
    fn lru_eviction() {
        let config = CacheConfig {
            capacity: 2,
            ..Default::default()
        };
        let cache = L0WorkerCache::new(&config);
        let keys: Vec<_> = ["w1", "w2", "w3"]
            .iter()
            .map(|uuid| WorkerCacheKey::for_uuid(uuid))
            .collect();

        cache.put(keys[0].clone(), CachedLookup::Missing);
        cache.put(keys[1].clone(), CachedLookup::Missing);
        cache.put(keys[2].clone(), CachedLookup::Missing);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&keys[0]).is_none()); // Evicted
        assert!(cache.get(&keys[1]).is_some());
        assert!(cache.get(&keys[2]).is_some());
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let cache = L0WorkerCache::new(&CacheConfig::default());
        let key = WorkerCacheKey::for_uuid("w1");

        cache.put(key.clone(), CachedLookup::Missing);
        cache.put(key.clone(), CachedLookup::Found(sample_record("w1")));

        assert_eq!(cache.len(), 1);
        assert!(matches!(cache.get(&key), Some(CachedLookup::Found(_))));
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let cache = L0WorkerCache::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache
                .entries
                .write()
                .expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        let key = WorkerCacheKey::for_uuid("w1");
        cache.put(key.clone(), CachedLookup::Missing);
        assert!(cache.get(&key).is_some());
        cache.clear();
        assert!(cache.is_empty());
    }
}
