//! In-process durable store for worker records.
//!
//! Transactions stage their writes privately and publish them atomically on
//! commit, which is enough isolation for the cache protocol: readers never see
//! an uncommitted binding.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::debug;

use crate::application::repos::{RepoError, WorkerTransaction, WorkersRepo};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::WorkerRecord;

const SOURCE: &str = "infra::memory";

#[derive(Default)]
pub struct InMemoryWorkersRepo {
    records: RwLock<HashMap<String, WorkerRecord>>,
    lookups: AtomicUsize,
    commits: AtomicUsize,
    fail_next_commit: AtomicBool,
}

impl InMemoryWorkersRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed record for `uuid`, without counting as a lookup.
    pub fn snapshot(&self, uuid: &str) -> Option<WorkerRecord> {
        rw_read(&self.records, SOURCE, "snapshot").get(uuid).cloned()
    }

    /// Number of committed records.
    pub fn len(&self) -> usize {
        rw_read(&self.records, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-transactional lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Make the next commit fail with a persistence error, discarding its writes.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

impl WorkersRepo for InMemoryWorkersRepo {
    fn find_by_uuid(&self, uuid: &str) -> Result<Option<WorkerRecord>, RepoError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot(uuid))
    }

    fn begin(&self) -> Result<Box<dyn WorkerTransaction + '_>, RepoError> {
        Ok(Box::new(MemoryTransaction {
            repo: self,
            staged: HashMap::new(),
        }))
    }
}

struct MemoryTransaction<'a> {
    repo: &'a InMemoryWorkersRepo,
    staged: HashMap<String, WorkerRecord>,
}

impl WorkerTransaction for MemoryTransaction<'_> {
    fn find_by_uuid(&mut self, uuid: &str) -> Result<Option<WorkerRecord>, RepoError> {
        if let Some(record) = self.staged.get(uuid) {
            return Ok(Some(record.clone()));
        }
        Ok(self.repo.snapshot(uuid))
    }

    fn save_or_update(&mut self, record: &WorkerRecord) -> Result<(), RepoError> {
        self.staged.insert(record.uuid().to_string(), record.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let MemoryTransaction { repo, staged } = *self;
        if repo.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(RepoError::from_persistence("injected commit failure"));
        }

        let staged_count = staged.len();
        rw_write(&repo.records, SOURCE, "commit").extend(staged);
        repo.commits.fetch_add(1, Ordering::SeqCst);
        debug!(staged = staged_count, "In-memory transaction committed");
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        debug!(discarded = self.staged.len(), "In-memory transaction rolled back");
        Ok(())
    }
}
