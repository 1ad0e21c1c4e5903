//! Convenient imports for batchlog.
//!
//! ```ignore
//! use batchlog::prelude::*;
//!
//! let log = CommitLog::new(Arc::new(MemoryStore::new()), CommitLogConfig::default())?;
//! log.open()?;
//! log.write(b"payload")?;
//! ```

// Main entry point
pub use crate::{CommitLog, CommitLogBuilder, CommitLogConfig};

// Error handling
pub use crate::{Error, Result};

// Writes, replay and truncation
pub use crate::{FlushOutcome, LogChunk, LogStatus, TruncationToken};

// Storage
pub use crate::{MemoryStore, OrderedStore};

pub use std::sync::Arc;
