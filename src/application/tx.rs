//! Transaction template with post-commit actions.
//!
//! [`TransactionTemplate::execute`] is the only way to obtain a [`TxContext`],
//! so registering an after-commit action outside an open transaction cannot be
//! expressed.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::WorkerRecord;

use super::repos::{RepoError, WorkerTransaction, WorkersRepo};

type AfterCommit = Box<dyn FnOnce() + Send + 'static>;

/// Handle passed to a transaction body.
pub struct TxContext<'r> {
    tx: Box<dyn WorkerTransaction + 'r>,
    after_commit: Vec<AfterCommit>,
}

impl TxContext<'_> {
    pub fn find_by_uuid(&mut self, uuid: &str) -> Result<Option<WorkerRecord>, RepoError> {
        self.tx.find_by_uuid(uuid)
    }

    pub fn save_or_update(&mut self, record: &WorkerRecord) -> Result<(), RepoError> {
        self.tx.save_or_update(record)
    }

    /// Run `action` once the enclosing transaction has committed.
    ///
    /// Actions run in registration order on the committing thread, before
    /// [`TransactionTemplate::execute`] returns. They are dropped unrun if the
    /// body fails, the commit fails, or the body panics.
    pub fn after_commit(&mut self, action: impl FnOnce() + Send + 'static) {
        self.after_commit.push(Box::new(action));
    }
}

#[derive(Clone)]
pub struct TransactionTemplate {
    repo: Arc<dyn WorkersRepo>,
}

impl TransactionTemplate {
    pub fn new(repo: Arc<dyn WorkersRepo>) -> Self {
        Self { repo }
    }

    /// Run `body` in a transaction: commit on `Ok`, roll back on `Err`.
    pub fn execute<T, F>(&self, body: F) -> Result<T, RepoError>
    where
        F: FnOnce(&mut TxContext<'_>) -> Result<T, RepoError>,
    {
        let mut ctx = TxContext {
            tx: self.repo.begin()?,
            after_commit: Vec::new(),
        };

        let outcome = body(&mut ctx);
        let TxContext { tx, after_commit } = ctx;

        let value = match outcome {
            Ok(value) => value,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "Rollback failed after transaction body error");
                }
                debug!(
                    discarded_actions = after_commit.len(),
                    error = %err,
                    "Transaction rolled back"
                );
                return Err(err);
            }
        };

        tx.commit()?;
        run_after_commit(after_commit);
        Ok(value)
    }
}

fn run_after_commit(actions: Vec<AfterCommit>) {
    for (index, action) in actions.into_iter().enumerate() {
        if catch_unwind(AssertUnwindSafe(action)).is_err() {
            warn!(action_index = index, "After-commit action panicked");
        }
    }
}
