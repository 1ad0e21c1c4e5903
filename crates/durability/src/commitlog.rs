//! The commit log
//!
//! [`CommitLog`] owns the accumulator, the flush worker and the store
//! handle. Writers call [`CommitLog::write`] (or [`CommitLog::submit`] to
//! await later) and block until the batch their bytes joined is durable.
//!
//! ```text
//! writer ──submit──► BatchAccumulator ◄──take_batch── flush worker ──commit──► store
//!    ▲                    │                                │
//!    └──── wait ──── FlushOutcome ◄────── resolve ─────────┘
//! ```

use batchlog_core::{Error, Namespace, Result};
use batchlog_storage::OrderedStore;
use parking_lot::Mutex;
use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use crate::accumulator::BatchAccumulator;
use crate::clock::{Clock, SystemClock};
use crate::config::CommitLogConfig;
use crate::lifecycle::LogStatus;
use crate::outcome::FlushOutcome;
use crate::replay::{self, LogChunk};
use crate::sequencer::KeySequencer;
use crate::truncation::TruncationToken;
use crate::worker::{self, FlushWorker, WorkerCommand, WorkerHandle};

/// Group-commit log over an ordered transactional store.
///
/// Create with [`CommitLog::new`] or [`CommitLogBuilder`], then
/// [`open`](CommitLog::open) it. Share between writer threads with an `Arc`.
///
/// # Example
///
/// ```ignore
/// use batchlog::prelude::*;
///
/// let store = Arc::new(MemoryStore::new());
/// let log = CommitLog::new(store, CommitLogConfig::default())?;
/// log.open()?;
///
/// log.write(b"set x=1")?;           // returns once durable
/// let token = log.write_with_token(b"set y=2")?;
///
/// log.truncate(&token)?;            // history through y=2 is applied
/// log.close()?;
/// ```
pub struct CommitLog<S: OrderedStore> {
    store: Arc<S>,
    config: CommitLogConfig,
    namespace: Namespace,
    accumulator: Arc<BatchAccumulator>,
    /// Present while open. Also serializes open and close.
    worker: Mutex<Option<WorkerHandle>>,
}

impl<S: OrderedStore> CommitLog<S> {
    /// Create an unopened log with the given configuration.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the configuration is invalid.
    pub fn new(store: Arc<S>, config: CommitLogConfig) -> Result<Self> {
        CommitLogBuilder::new().config(config).build(store)
    }

    /// Start the flush worker and begin accepting writes.
    ///
    /// Seeds the key sequencer from the store first, so chunks written now
    /// sort after everything a previous incarnation left behind.
    ///
    /// # Errors
    ///
    /// - [`Error::Usage`] if the log was already opened (even if closed since)
    /// - [`Error::Storage`] if reading the last key fails
    pub fn open(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        self.accumulator.status().check_open()?;

        let sequencer = KeySequencer::recover(&*self.store, self.namespace.clone())?;
        let next_sequence = sequencer.next_sequence();
        let handle = FlushWorker {
            store: Arc::clone(&self.store),
            accumulator: Arc::clone(&self.accumulator),
            sequencer,
            namespace: self.namespace.clone(),
            ideal_batch_size: self.config.ideal_batch_size,
            tick: self.config.flush_interval,
        }
        .spawn()?;

        if let Err(e) = self.accumulator.open() {
            let _ = handle.shutdown();
            return Err(e);
        }
        *worker = Some(handle);

        tracing::info!(
            namespace = %self.namespace,
            next_sequence,
            ideal_batch_size = self.config.ideal_batch_size,
            max_pending_bytes = self.config.max_pending_bytes,
            flush_interval = ?self.config.flush_interval,
            "commit log opened"
        );
        Ok(())
    }

    /// Stop accepting writes, flush what is buffered, stop the worker.
    ///
    /// Writes accepted before this call are part of the final flush and
    /// their writers receive its result. Writes attempted after it fail
    /// with [`Error::Usage`].
    ///
    /// # Errors
    ///
    /// - [`Error::Usage`] unless the log is open
    /// - [`Error::ShutdownFlush`] if the final flush failed
    pub fn close(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        self.accumulator.close()?;

        let handle = worker
            .take()
            .ok_or_else(|| Error::Internal("open commit log has no flush worker".to_string()))?;
        match handle.shutdown() {
            Ok(()) => {
                tracing::info!(namespace = %self.namespace, "commit log closed");
                Ok(())
            }
            Err(Error::Storage(msg)) => {
                tracing::error!(namespace = %self.namespace, error = %msg, "final commit log flush failed");
                Err(Error::ShutdownFlush(msg))
            }
            Err(e) => {
                tracing::error!(namespace = %self.namespace, error = %e, "error closing commit log");
                Err(e)
            }
        }
    }

    /// Append `data` and block until its batch is durable.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `data` is empty
    /// - [`Error::Usage`] unless the log is open
    /// - [`Error::Capacity`] if the buffer is full; retry later
    /// - [`Error::Storage`] if the batch failed to persist. The bytes are
    ///   gone; resubmit them if they still matter.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.submit(data)?.wait().map(|_| ())
    }

    /// Append `data` and return its batch outcome without waiting.
    ///
    /// Synchronous rejections (validation, usage, capacity) are returned
    /// here; the flush result arrives through the outcome.
    pub fn submit(&self, data: &[u8]) -> Result<FlushOutcome> {
        self.accumulator.submit(data)
    }

    /// Like [`write`](CommitLog::write), also returning a token that
    /// truncates through the chunk holding the end of this batch.
    pub fn write_with_token(&self, data: &[u8]) -> Result<TruncationToken> {
        let last = self.submit(data)?.wait()?;
        Ok(TruncationToken::through(&last))
    }

    /// Flush whatever is buffered now instead of at the next interval.
    ///
    /// Returns the result of the batch this call swapped out, or `Ok` if the
    /// buffer was empty. A batch a worker tick already took is not covered;
    /// writers learn their own result from [`FlushOutcome::wait`].
    pub fn flush(&self) -> Result<()> {
        self.accumulator.status().require_open("flush")?;
        let commands = self.commands()?;
        worker::request(&commands, |reply| WorkerCommand::Flush { reply })
    }

    /// Delete every chunk up to and including the one `token` came from.
    ///
    /// Idempotent: repeating a token, or passing one older than a previous
    /// truncation, is a no-op.
    ///
    /// # Errors
    ///
    /// - [`Error::Usage`] unless the log is open
    /// - [`Error::Validation`] if the token came from another namespace
    /// - [`Error::Storage`] if clearing failed; nothing was deleted
    pub fn truncate(&self, token: &TruncationToken) -> Result<()> {
        self.accumulator.status().require_open("truncate")?;
        token.check_namespace(&self.namespace)?;
        let commands = self.commands()?;
        worker::request(&commands, |reply| WorkerCommand::Truncate {
            token: token.clone(),
            reply,
        })
    }

    /// Read every surviving chunk in write order.
    ///
    /// Allowed in any state; usually called before [`open`](CommitLog::open)
    /// to rebuild state after a crash.
    pub fn replay(&self) -> Result<Vec<LogChunk>> {
        replay::replay(&*self.store, &self.namespace)
    }

    /// Current lifecycle state
    pub fn status(&self) -> LogStatus {
        self.accumulator.status()
    }

    /// Bytes buffered and not yet handed to the worker
    pub fn pending_bytes(&self) -> usize {
        self.accumulator.pending_bytes()
    }

    /// Configuration this log was built with
    pub fn config(&self) -> &CommitLogConfig {
        &self.config
    }

    /// Key prefix of this log
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn commands(&self) -> Result<Sender<WorkerCommand>> {
        self.worker
            .lock()
            .as_ref()
            .map(WorkerHandle::sender)
            .ok_or_else(|| Error::usage("commit log is not open"))
    }
}

impl<S: OrderedStore> fmt::Debug for CommitLog<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitLog")
            .field("namespace", &self.namespace)
            .field("status", &self.status())
            .field("pending_bytes", &self.pending_bytes())
            .finish()
    }
}

impl<S: OrderedStore> Drop for CommitLog<S> {
    fn drop(&mut self) {
        if self.accumulator.status().is_open() {
            if let Err(e) = self.close() {
                tracing::error!(namespace = %self.namespace, error = %e, "error closing commit log on drop");
            }
        }
    }
}

/// Builder for [`CommitLog`].
///
/// # Example
///
/// ```ignore
/// let log = CommitLogBuilder::new()
///     .namespace("orders-log")
///     .ideal_batch_size(8192)
///     .flush_interval(Duration::from_millis(2))
///     .build(store)?;
/// ```
pub struct CommitLogBuilder {
    config: CommitLogConfig,
    clock: Arc<dyn Clock>,
}

impl CommitLogBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: CommitLogConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CommitLogConfig) -> Self {
        self.config = config;
        self
    }

    /// Max bytes per persisted chunk.
    pub fn ideal_batch_size(mut self, bytes: usize) -> Self {
        self.config.ideal_batch_size = bytes;
        self
    }

    /// Ceiling on buffered, not-yet-durable bytes.
    pub fn max_pending_bytes(mut self, bytes: usize) -> Self {
        self.config.max_pending_bytes = bytes;
        self
    }

    /// Minimum spacing between flush attempts.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Key prefix of the log inside the store.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Time source for flush scheduling. Tests pass a
    /// [`ManualClock`](crate::ManualClock).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the configuration and create an unopened log over `store`.
    pub fn build<S: OrderedStore>(self, store: Arc<S>) -> Result<CommitLog<S>> {
        let namespace = self.config.validate()?;
        let accumulator = Arc::new(BatchAccumulator::new(
            self.config.max_pending_bytes,
            self.config.flush_interval,
            self.clock,
        ));
        Ok(CommitLog {
            store,
            config: self.config,
            namespace,
            accumulator,
            worker: Mutex::new(None),
        })
    }
}

impl Default for CommitLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
