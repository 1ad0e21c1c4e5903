//! Flush outcome broadcaster
//!
//! One `FlushOutcome` exists per batch. Every writer that appends into the
//! batch holds a clone; the flush worker resolves it exactly once with the
//! last durable key (or the storage error), and every waiter wakes with the
//! same result.
//!
//! ```text
//! writer A ──┐
//! writer B ──┼──► FlushOutcome(batch 7) ◄── worker: resolve(Ok(key))
//! writer C ──┘
//! ```

use batchlog_core::{ChunkKey, Result};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Shared {
    batch_id: u64,
    result: Mutex<Option<Result<ChunkKey>>>,
    resolved: Condvar,
}

/// Shared handle to the eventual result of one batch.
#[derive(Clone)]
pub struct FlushOutcome {
    shared: Arc<Shared>,
}

impl FlushOutcome {
    pub(crate) fn new(batch_id: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                batch_id,
                result: Mutex::new(None),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Identifier of the batch this outcome belongs to.
    ///
    /// Two writes with the same batch id were group-committed together.
    pub fn batch_id(&self) -> u64 {
        self.shared.batch_id
    }

    /// Block until the batch is resolved and return its result.
    ///
    /// `Ok` carries the last key written by the batch's transaction.
    pub fn wait(&self) -> Result<ChunkKey> {
        let mut result = self.shared.result.lock();
        loop {
            if let Some(resolved) = result.as_ref() {
                return resolved.clone();
            }
            self.shared.resolved.wait(&mut result);
        }
    }

    /// Block for at most `timeout`.
    ///
    /// Returns `None` if the batch is still pending when the timeout
    /// elapses. Giving up does not withdraw the bytes from the batch.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<ChunkKey>> {
        let deadline = Instant::now() + timeout;
        let mut result = self.shared.result.lock();
        loop {
            if let Some(resolved) = result.as_ref() {
                return Some(resolved.clone());
            }
            if self
                .shared
                .resolved
                .wait_until(&mut result, deadline)
                .timed_out()
            {
                return result.clone();
            }
        }
    }

    /// Check whether the batch has been resolved
    pub fn is_resolved(&self) -> bool {
        self.shared.result.lock().is_some()
    }

    /// Publish the batch result and wake every waiter.
    ///
    /// Returns `false` if the outcome was already resolved; the first result
    /// is kept.
    pub(crate) fn resolve(&self, outcome: Result<ChunkKey>) -> bool {
        let mut result = self.shared.result.lock();
        if result.is_some() {
            tracing::error!(
                batch_id = self.shared.batch_id,
                "flush outcome resolved more than once; keeping first result"
            );
            return false;
        }
        *result = Some(outcome);
        self.shared.resolved.notify_all();
        true
    }

    /// Whether both handles refer to the same batch
    pub fn same_batch(&self, other: &FlushOutcome) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for FlushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushOutcome")
            .field("batch_id", &self.shared.batch_id)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
