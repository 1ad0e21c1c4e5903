//! Error types for the commit log
//!
//! Errors fall into two delivery classes:
//! - Synchronous: [`Error::Usage`], [`Error::Validation`] and [`Error::Capacity`]
//!   are returned at the call site and never travel through a flush outcome.
//! - Asynchronous: [`Error::Storage`] is broadcast to every writer that joined
//!   the failed batch.
//!
//! The enum is `Clone` because a single storage failure is observed by many
//! waiters at once.

use thiserror::Error;

/// All commit log errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Operation is invalid for the current lifecycle state
    #[error("usage error: {0}")]
    Usage(String),

    /// Malformed input (empty payload, bad configuration, foreign token)
    #[error("validation error: {0}")]
    Validation(String),

    /// Write would push buffered bytes above the configured ceiling
    #[error("commit log queue is full: {pending} pending + {incoming} incoming > {limit} bytes")]
    Capacity {
        /// Bytes buffered at the time of the rejected write
        pending: usize,
        /// Size of the rejected payload
        incoming: usize,
        /// Configured `max_pending_bytes`
        limit: usize,
    },

    /// The backing store transaction failed
    #[error("storage error: {0}")]
    Storage(String),

    /// The final flush performed by `close` failed
    #[error("final flush during close failed: {0}")]
    ShutdownFlush(String),

    /// Bug or broken internal invariant (e.g. the flush worker died)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for commit log operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a [`Error::Usage`] error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }

    /// Shorthand for a [`Error::Validation`] error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Shorthand for a [`Error::Storage`] error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Check if this is a lifecycle misuse error.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }

    /// Check if this is an input validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a backpressure rejection.
    pub fn is_capacity(&self) -> bool {
        matches!(self, Error::Capacity { .. })
    }

    /// Check if this is a storage failure.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    /// Check if this error was returned at the call site rather than
    /// through a flush outcome.
    ///
    /// Synchronous errors leave the buffer untouched, so the caller may
    /// resubmit the same payload.
    pub fn is_synchronous(&self) -> bool {
        matches!(
            self,
            Error::Usage(_) | Error::Validation(_) | Error::Capacity { .. }
        )
    }
}
