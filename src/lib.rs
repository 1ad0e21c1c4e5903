//! # Batchlog
//!
//! Group-commit write-ahead log over a transactional ordered key-value store.
//!
//! Many threads append small byte payloads; a background worker batches
//! them into few large transactions and every writer learns the result of
//! the batch its bytes landed in. Consumers replay durable history after a
//! crash and truncate it once applied.
//!
//! ## Quick Start
//!
//! ```ignore
//! use batchlog::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let log = CommitLog::new(store, CommitLogConfig::default())?;
//!
//! // Rebuild state from surviving history before accepting new writes
//! for chunk in log.replay()? {
//!     apply(&chunk.data);
//! }
//! log.open()?;
//!
//! // Blocks until durable; concurrent writers share one transaction
//! let token = log.write_with_token(b"op-1")?;
//!
//! // Once op-1 is reflected in primary state
//! log.truncate(&token)?;
//!
//! log.close()?;
//! ```
//!
//! ## Crates
//!
//! - [`batchlog_core`] - error type, namespaces and chunk keys
//! - [`batchlog_storage`] - the [`OrderedStore`] contract and [`MemoryStore`]
//! - [`batchlog_durability`] - [`CommitLog`] and its worker

#![warn(missing_docs)]

pub mod prelude;

pub use batchlog_core::{ChunkKey, Error, Namespace, Result};
pub use batchlog_durability::{
    Clock, CommitLog, CommitLogBuilder, CommitLogConfig, FlushOutcome, LogChunk, LogStatus,
    ManualClock, SystemClock, TruncationToken, DEFAULT_FLUSH_INTERVAL, DEFAULT_IDEAL_BATCH_SIZE,
    DEFAULT_MAX_PENDING_BYTES, DEFAULT_NAMESPACE,
};
pub use batchlog_storage::{
    KvPair, MemoryStore, Mutation, OrderedStore, StoreError, StoreResult, Transaction,
};
