//! Worker cookie bindings behind a commit-aware read-through cache.
//!
//! Reads consult the cache first and fill it (negative results included) under
//! the key's lock. Writes take the same lock, upsert inside a transaction and
//! evict the key only after that transaction commits. Eviction runs before the
//! writer releases the lock, so a concurrent reader can never cache a lookup
//! that straddled the commit.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::cache::{CacheConfig, CachedLookup, KeyLocks, WorkerCache, WorkerCacheKey};
use crate::domain::{WorkerIdentity, WorkerRecord};

use super::repos::{RepoError, WorkersRepo};
use super::tx::TransactionTemplate;

const METRIC_CACHE_INVALIDATE: &str = "worker_cookies_cache_invalidate_total";
const METRIC_DURABLE_WRITE: &str = "worker_cookies_durable_write_total";
const METRIC_RECONCILE: &str = "worker_cookies_reconcile_total";
const METRIC_WRITE_MS: &str = "worker_cookies_write_ms";

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker lookup failed: {0}")]
    Lookup(#[source] RepoError),
    #[error("worker cookie write failed: {0}")]
    Write(#[source] RepoError),
}

#[derive(Clone)]
pub struct WorkerCookieService {
    repo: Arc<dyn WorkersRepo>,
    transactions: TransactionTemplate,
    cache: Arc<dyn WorkerCache>,
    locks: Arc<KeyLocks>,
    config: CacheConfig,
}

impl WorkerCookieService {
    pub fn new(
        repo: Arc<dyn WorkersRepo>,
        cache: Arc<dyn WorkerCache>,
        config: CacheConfig,
    ) -> Self {
        Self {
            transactions: TransactionTemplate::new(Arc::clone(&repo)),
            repo,
            cache,
            locks: Arc::new(KeyLocks::new()),
            config,
        }
    }

    /// Cookie bound to the worker's uuid, if any.
    pub fn cookie_for(&self, identity: &WorkerIdentity) -> Result<Option<String>, WorkerError> {
        Ok(self.record_for(identity)?.map(|record| record.cookie))
    }

    /// Stored record for the worker's uuid, served from cache when possible.
    #[instrument(skip(self), fields(worker = %identity.uuid))]
    pub fn record_for(
        &self,
        identity: &WorkerIdentity,
    ) -> Result<Option<WorkerRecord>, WorkerError> {
        let key = WorkerCacheKey::for_uuid(&identity.uuid);

        if !self.config.enabled {
            return self
                .locks
                .with_lock(&key, || self.repo.find_by_uuid(&identity.uuid))
                .map_err(WorkerError::Lookup);
        }

        if let Some(hit) = self.cache.get(&key) {
            debug!(negative = matches!(hit, CachedLookup::Missing), "Worker cache hit");
            return Ok(hit.into_record());
        }

        self.locks.with_lock(&key, || {
            // Whoever held the lock before us may have filled the key already.
            if let Some(hit) = self.cache.peek(&key) {
                debug!("Worker cache filled while waiting for key lock");
                return Ok(hit.into_record());
            }

            let found = self
                .repo
                .find_by_uuid(&identity.uuid)
                .map_err(WorkerError::Lookup)?;
            debug!(found = found.is_some(), "Worker cache filled from durable store");
            self.cache.put(key.clone(), CachedLookup::from(found.clone()));
            Ok(found)
        })
    }

    /// Bind `cookie` to the worker, creating the record or updating it in place.
    ///
    /// The cached entry for the worker is evicted once the write commits; a
    /// failed or rolled-back write leaves both the store and the cache untouched.
    #[instrument(skip(self, cookie), fields(worker = %identity.uuid))]
    pub fn associate_cookie(
        &self,
        identity: &WorkerIdentity,
        cookie: &str,
    ) -> Result<(), WorkerError> {
        let written = self.write_locked(identity, |stored| {
            Some(match stored {
                Some(mut existing) => {
                    existing.update(cookie, identity);
                    (existing, "update")
                }
                None => (WorkerRecord::new(identity, cookie), "create"),
            })
        })?;

        if let Some(op) = written {
            info!(worker = %identity, op, "Worker cookie associated");
        }
        Ok(())
    }

    /// Rewrite the stored hostname and ip address when they no longer match
    /// `identity`, keeping the existing cookie.
    ///
    /// Always reads durable state. Unknown workers and matching locations are
    /// left alone. Drift is confirmed again under the key lock, so a cookie
    /// committed concurrently is kept rather than reverted.
    #[instrument(skip(self), fields(worker = %identity.uuid))]
    pub fn sync_identity(&self, identity: &WorkerIdentity) -> Result<(), WorkerError> {
        let Some(stored) = self
            .repo
            .find_by_uuid(&identity.uuid)
            .map_err(WorkerError::Lookup)?
        else {
            debug!("No stored record to reconcile");
            return Ok(());
        };

        if stored.matches_location(identity) {
            debug!("Stored worker location is current");
            return Ok(());
        }

        let rewritten = self.write_locked(identity, |current| {
            let mut record = current.filter(|record| !record.matches_location(identity))?;
            record.relocate(identity);
            Some((record, "update"))
        })?;

        if rewritten.is_none() {
            debug!("Worker location settled by a concurrent write");
            return Ok(());
        }

        counter!(METRIC_RECONCILE).increment(1);
        info!(
            worker = %identity,
            stored_hostname = %stored.hostname,
            stored_ip_address = %stored.ip_address,
            "Worker location drifted; binding rewritten"
        );
        Ok(())
    }

    /// One upsert for `identity` under its key lock.
    ///
    /// `decide` sees the record as the transaction reads it and returns the
    /// record to save with its write op, or `None` to save nothing.
    fn write_locked<D>(
        &self,
        identity: &WorkerIdentity,
        decide: D,
    ) -> Result<Option<&'static str>, WorkerError>
    where
        D: FnOnce(Option<WorkerRecord>) -> Option<(WorkerRecord, &'static str)>,
    {
        let key = WorkerCacheKey::for_uuid(&identity.uuid);
        let started_at = Instant::now();

        let written = self
            .locks
            .with_lock(&key, || {
                self.transactions.execute(|tx| {
                    let Some((record, op)) = decide(tx.find_by_uuid(&identity.uuid)?) else {
                        return Ok(None);
                    };
                    tx.save_or_update(&record)?;

                    let cache = Arc::clone(&self.cache);
                    let evict = key.clone();
                    tx.after_commit(move || {
                        cache.remove(&evict);
                        counter!(METRIC_CACHE_INVALIDATE).increment(1);
                    });
                    Ok(Some(op))
                })
            })
            .map_err(WorkerError::Write)?;

        if let Some(op) = written {
            counter!(METRIC_DURABLE_WRITE, "op" => op).increment(1);
            histogram!(METRIC_WRITE_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(written)
    }
}
