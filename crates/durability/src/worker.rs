//! Background flush worker
//!
//! One thread per open log drives every store write. It wakes once per
//! `flush_interval` (or when a command arrives) and:
//!
//! 1. swaps the current batch out of the accumulator if a flush is due,
//! 2. splits it into chunks of at most `ideal_batch_size` bytes,
//! 3. writes every chunk under a fresh key in ONE transaction,
//! 4. resolves the batch outcome with the last key or the storage error.
//!
//! A failed batch is dropped, not re-buffered: its writers get the error
//! and the loop carries on with the next batch.
//!
//! The wait between ticks is `recv_timeout` on the command channel, so
//! shutdown and explicit requests never wait for a tick to expire.

use batchlog_core::{ChunkKey, Error, Namespace, Result};
use batchlog_storage::{OrderedStore, Transaction};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::accumulator::{BatchAccumulator, SwappedBatch};
use crate::outcome::FlushOutcome;
use crate::sequencer::KeySequencer;
use crate::truncation::{self, TruncationToken};

/// Requests the log sends to its worker. Every request carries a reply
/// channel the worker answers exactly once.
pub(crate) enum WorkerCommand {
    /// Flush now, ignoring the interval
    Flush { reply: Sender<Result<()>> },
    /// Clear history through `token`
    Truncate {
        token: TruncationToken,
        reply: Sender<Result<()>>,
    },
    /// Final flush, then exit
    Shutdown { reply: Sender<Result<()>> },
}

pub(crate) struct FlushWorker<S: OrderedStore> {
    pub store: Arc<S>,
    pub accumulator: Arc<BatchAccumulator>,
    pub sequencer: KeySequencer,
    pub namespace: Namespace,
    pub ideal_batch_size: usize,
    pub tick: Duration,
}

/// Owning handle to a running worker thread.
pub(crate) struct WorkerHandle {
    commands: Sender<WorkerCommand>,
    accumulator: Arc<BatchAccumulator>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    pub(crate) fn sender(&self) -> Sender<WorkerCommand> {
        self.commands.clone()
    }

    /// Ask for the final flush, wait for its result, join the thread.
    ///
    /// A worker that panicked never sealed the accumulator, so writers of
    /// the current batch are failed here instead.
    pub(crate) fn shutdown(self) -> Result<()> {
        let result = request(&self.commands, |reply| WorkerCommand::Shutdown { reply });
        if self.thread.join().is_err() {
            let error = Error::Internal("flush worker panicked".to_string());
            tracing::error!(error = %error, "commit log worker died; failing unflushed writes");
            self.accumulator.seal(error.clone());
            return Err(error);
        }
        result
    }
}

/// Send a command built by `make` and block for the worker's reply.
pub(crate) fn request(
    commands: &Sender<WorkerCommand>,
    make: impl FnOnce(Sender<Result<()>>) -> WorkerCommand,
) -> Result<()> {
    let (reply, response) = mpsc::channel();
    commands
        .send(make(reply))
        .map_err(|_| Error::usage("commit log worker has stopped"))?;
    response
        .recv()
        .map_err(|_| Error::usage("commit log closed before the request ran"))?
}

/// Resolves the outcome with an internal error if a flush unwinds before
/// resolving it, so no writer waits forever on a dead worker.
struct ResolveGuard(Option<FlushOutcome>);

impl ResolveGuard {
    fn resolve(mut self, result: Result<ChunkKey>) {
        if let Some(outcome) = self.0.take() {
            outcome.resolve(result);
        }
    }
}

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        if let Some(outcome) = self.0.take() {
            outcome.resolve(Err(Error::Internal(
                "flush worker stopped before resolving batch".to_string(),
            )));
        }
    }
}

impl<S: OrderedStore> FlushWorker<S> {
    pub(crate) fn spawn(self) -> Result<WorkerHandle> {
        let (commands, receiver) = mpsc::channel();
        let accumulator = Arc::clone(&self.accumulator);
        let thread = thread::Builder::new()
            .name(format!("commitlog-flush-{}", self.namespace))
            .spawn(move || self.run(receiver))
            .map_err(|e| Error::Internal(format!("failed to spawn flush worker: {}", e)))?;
        Ok(WorkerHandle {
            commands,
            accumulator,
            thread,
        })
    }

    fn run(mut self, commands: Receiver<WorkerCommand>) {
        tracing::debug!(namespace = %self.namespace, tick = ?self.tick, "flush worker started");
        loop {
            match commands.recv_timeout(self.tick) {
                Ok(WorkerCommand::Flush { reply }) => {
                    let _ = reply.send(self.flush(true));
                }
                Ok(WorkerCommand::Truncate { token, reply }) => {
                    let result = truncation::truncate(&*self.store, &self.namespace, &token);
                    match &result {
                        Ok(()) => tracing::debug!(?token, "commit log truncated"),
                        Err(e) => tracing::error!(?token, error = %e, "error truncating commit log"),
                    }
                    let _ = reply.send(result);
                }
                Ok(WorkerCommand::Shutdown { reply }) => {
                    let result = self.flush(true);
                    self.accumulator.seal(Error::usage("commit log closed"));
                    let _ = reply.send(result);
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    // Handle dropped without a shutdown request
                    let _ = self.flush(true);
                    break;
                }
            }
            let _ = self.flush(false);
        }
        tracing::debug!(namespace = %self.namespace, "flush worker stopped");
    }

    /// Swap out and persist the current batch if one is due.
    ///
    /// Returns the batch's result, or `Ok` if nothing was due.
    fn flush(&mut self, force: bool) -> Result<()> {
        let Some(SwappedBatch { bytes, outcome }) = self.accumulator.take_batch(force) else {
            return Ok(());
        };
        let batch_id = outcome.batch_id();
        let guard = ResolveGuard(Some(outcome));

        let result = self.persist(&bytes);
        match &result {
            Ok(last) => tracing::debug!(
                batch_id,
                bytes = bytes.len(),
                last_sequence = last.sequence(),
                "flushed commit log batch"
            ),
            Err(e) => tracing::error!(
                batch_id,
                bytes = bytes.len(),
                error = %e,
                "error flushing commit log; batch dropped"
            ),
        }

        guard.resolve(result.clone());
        self.accumulator.recycle(bytes);
        result.map(|_| ())
    }

    /// Write `bytes` as consecutive chunks in one transaction, together
    /// with the updated high-water mark.
    fn persist(&mut self, bytes: &[u8]) -> Result<ChunkKey> {
        let chunks = split_chunks(bytes, self.ideal_batch_size);
        let mut txn = Transaction::with_capacity(chunks.len() + 1);
        let mut last = None;
        for chunk in chunks {
            let key = self.sequencer.next_key()?;
            txn.set(key.as_bytes(), chunk);
            last = Some(key);
        }
        let last = last.ok_or_else(|| Error::Internal("flushed an empty batch".to_string()))?;
        let (mark, next) = self.sequencer.high_water();
        txn.set(mark, next);
        self.store.commit(txn)?;
        Ok(last)
    }
}

/// Split `bytes` into consecutive slices of at most `max` bytes.
///
/// Chunk boundaries ignore write boundaries: a write may span two chunks.
/// Replay concatenates chunks in key order, which restores the appended
/// byte stream exactly.
pub(crate) fn split_chunks(bytes: &[u8], max: usize) -> Vec<&[u8]> {
    bytes.chunks(max.max(1)).collect()
}
