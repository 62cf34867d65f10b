//! Repository traits describing persistence adapters.

use thiserror::Error;

use crate::domain::WorkerRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Durable store of worker records, keyed by uuid.
pub trait WorkersRepo: Send + Sync {
    /// Look up committed state outside any transaction.
    fn find_by_uuid(&self, uuid: &str) -> Result<Option<WorkerRecord>, RepoError>;

    fn begin(&self) -> Result<Box<dyn WorkerTransaction + '_>, RepoError>;
}

/// An open unit of work against a [`WorkersRepo`].
///
/// Reads observe this transaction's own staged writes. Nothing written here is
/// visible to other readers until [`WorkerTransaction::commit`] succeeds.
pub trait WorkerTransaction {
    fn find_by_uuid(&mut self, uuid: &str) -> Result<Option<WorkerRecord>, RepoError>;

    /// Insert or update keyed by the record's uuid.
    fn save_or_update(&mut self, record: &WorkerRecord) -> Result<(), RepoError>;

    fn commit(self: Box<Self>) -> Result<(), RepoError>;

    fn rollback(self: Box<Self>) -> Result<(), RepoError>;
}
