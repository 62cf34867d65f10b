//! Per-key mutual exclusion.
//!
//! Every [`WorkerCacheKey`] maps to one mutex for as long as some thread holds
//! or waits on it. Equal keys always resolve to the same mutex; distinct keys
//! never contend with each other. Idle mutexes are pruned so the registry only
//! tracks keys that are in flight.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use super::keys::WorkerCacheKey;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::key_lock";

#[derive(Default)]
pub struct KeyLocks {
    locks: DashMap<WorkerCacheKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `critical` while holding the lock for `key`.
    ///
    /// Blocks until every earlier holder of the same key has finished.
    pub fn with_lock<R>(&self, key: &WorkerCacheKey, critical: impl FnOnce() -> R) -> R {
        let slot = self.slot(key);
        let _guard = mutex_lock(slot.mutex(), SOURCE, "with_lock");
        critical()
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn slot<'a>(&'a self, key: &'a WorkerCacheKey) -> KeySlot<'a> {
        // Cloning under the shard lock keeps the strong count exact for pruning.
        let mutex = Arc::clone(
            self.locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        KeySlot {
            locks: &self.locks,
            key,
            mutex,
        }
    }
}

struct KeySlot<'a> {
    locks: &'a DashMap<WorkerCacheKey, Arc<Mutex<()>>>,
    key: &'a WorkerCacheKey,
    mutex: Arc<Mutex<()>>,
}

impl KeySlot<'_> {
    fn mutex(&self) -> &Mutex<()> {
        &self.mutex
    }
}

impl Drop for KeySlot<'_> {
    fn drop(&mut self) {
        // Registry plus this slot: nobody else holds or waits on the key.
        self.locks
            .remove_if(self.key, |_, mutex| Arc::strong_count(mutex) == 2);
    }
}
