//! Batch accumulator
//!
//! The accumulator is the single owner of everything writers and the flush
//! worker share: lifecycle status, the active and standby buffers, the
//! last-swap instant and the current [`FlushOutcome`]. All of it sits behind
//! one `parking_lot::Mutex`, and no method holds that lock across I/O.
//!
//! Writers only see [`BatchAccumulator::submit`], which appends and hands
//! back the outcome of the batch the bytes landed in. The worker only sees
//! [`BatchAccumulator::take_batch`] and [`BatchAccumulator::recycle`].
//!
//! # Double buffering
//!
//! ```text
//! take_batch():  active ──moved out──► in-flight flush
//!                standby ─────────────► active (empty, keeps capacity)
//! recycle(buf):  cleared buf ─────────► standby
//! ```
//!
//! After warmup the two buffers trade places and neither is reallocated.

use batchlog_core::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::lifecycle::LogStatus;
use crate::outcome::FlushOutcome;

/// A batch moved out of the accumulator, ready to persist.
#[derive(Debug)]
pub(crate) struct SwappedBatch {
    /// Appended bytes, in append order
    pub bytes: Vec<u8>,
    /// Outcome every writer of this batch is waiting on
    pub outcome: FlushOutcome,
}

struct Inner {
    status: LogStatus,
    active: Vec<u8>,
    standby: Vec<u8>,
    last_flush: Option<Instant>,
    outcome: FlushOutcome,
    batch_id: u64,
}

pub(crate) struct BatchAccumulator {
    max_pending_bytes: usize,
    flush_interval: Duration,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl BatchAccumulator {
    pub(crate) fn new(
        max_pending_bytes: usize,
        flush_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            max_pending_bytes,
            flush_interval,
            clock,
            inner: Mutex::new(Inner {
                status: LogStatus::Unopened,
                active: Vec::new(),
                standby: Vec::new(),
                last_flush: None,
                outcome: FlushOutcome::new(0),
                batch_id: 0,
            }),
        }
    }

    pub(crate) fn status(&self) -> LogStatus {
        self.inner.lock().status
    }

    /// Bytes appended since the last swap.
    ///
    /// The batch currently being persisted is not counted; the ceiling
    /// applies to the buffer writers are appending into.
    pub(crate) fn pending_bytes(&self) -> usize {
        self.inner.lock().active.len()
    }

    pub(crate) fn open(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.status.check_open()?;
        inner.status = LogStatus::Open;
        Ok(())
    }

    /// Move to `Closed`. From here on `submit` fails, so the next forced
    /// `take_batch` captures the last bytes that will ever be appended.
    pub(crate) fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.status.check_close()?;
        inner.status = LogStatus::Closed;
        Ok(())
    }

    /// Append `data` to the current batch and return that batch's outcome.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for an empty payload
    /// - [`Error::Usage`] unless the log is open
    /// - [`Error::Capacity`] if the buffer would exceed `max_pending_bytes`;
    ///   nothing is appended
    pub(crate) fn submit(&self, data: &[u8]) -> Result<FlushOutcome> {
        if data.is_empty() {
            return Err(Error::validation("commit log can not write empty chunk"));
        }

        let mut inner = self.inner.lock();
        inner.status.require_open("write into")?;

        let pending = inner.active.len();
        if pending.saturating_add(data.len()) > self.max_pending_bytes {
            return Err(Error::Capacity {
                pending,
                incoming: data.len(),
                limit: self.max_pending_bytes,
            });
        }

        inner.active.extend_from_slice(data);
        Ok(inner.outcome.clone())
    }

    /// Swap out the current batch if a flush is due.
    ///
    /// A flush is due when the buffer is non-empty and either `force` is set
    /// or `flush_interval` has passed since the previous swap. The swap and
    /// installation of a fresh outcome happen under one lock acquisition.
    pub(crate) fn take_batch(&self, force: bool) -> Option<SwappedBatch> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner.active.is_empty() {
            return None;
        }
        if !force {
            if let Some(last) = inner.last_flush {
                if now.saturating_duration_since(last) < self.flush_interval {
                    return None;
                }
            }
        }

        let standby = std::mem::take(&mut inner.standby);
        let bytes = std::mem::replace(&mut inner.active, standby);
        inner.last_flush = Some(now);
        inner.batch_id += 1;
        let fresh = FlushOutcome::new(inner.batch_id);
        let outcome = std::mem::replace(&mut inner.outcome, fresh);

        Some(SwappedBatch { bytes, outcome })
    }

    /// Hand a persisted batch buffer back for reuse as the standby buffer.
    pub(crate) fn recycle(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        let mut inner = self.inner.lock();
        if buffer.capacity() > inner.standby.capacity() {
            inner.standby = buffer;
        }
    }

    /// Resolve the outcome left current once no flush will run again.
    ///
    /// After a clean final flush the current batch is empty. If the worker
    /// died first, its bytes are discarded and its writers get `error`.
    pub(crate) fn seal(&self, error: Error) {
        let mut inner = self.inner.lock();
        inner.active.clear();
        if !inner.outcome.is_resolved() {
            inner.outcome.resolve(Err(error));
        }
    }
}
