//! Group-commit log for batchlog
//!
//! This crate turns many small concurrent appends into few large
//! transactions against an ordered key-value store:
//! - Accumulator: double-buffered byte batch with a pending-bytes ceiling
//! - Worker: one thread per log that swaps, chunks and commits batches
//! - Outcome: one result per batch, broadcast to every writer in it
//! - Sequencer: monotonic chunk keys, recovered from the store on open
//! - Truncation: unforgeable tokens that clear durable history
//! - Replay: read surviving chunks back in write order

#![warn(missing_docs)]
#![warn(clippy::all)]

mod accumulator;
pub mod clock;
pub mod commitlog;
pub mod config;
pub mod lifecycle;
pub mod outcome;
pub mod replay;
mod sequencer;
pub mod truncation;
mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use commitlog::{CommitLog, CommitLogBuilder};
pub use config::{
    CommitLogConfig, DEFAULT_FLUSH_INTERVAL, DEFAULT_IDEAL_BATCH_SIZE, DEFAULT_MAX_PENDING_BYTES,
    DEFAULT_NAMESPACE,
};
pub use lifecycle::LogStatus;
pub use outcome::FlushOutcome;
pub use replay::LogChunk;
pub use truncation::TruncationToken;
