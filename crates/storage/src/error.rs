//! Storage error types

use thiserror::Error;

/// Errors returned by an [`OrderedStore`](crate::OrderedStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The transaction did not commit; none of its mutations are visible
    #[error("transaction failed to commit: {0}")]
    CommitFailed(String),

    /// The store could not serve a read
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// A mutation was malformed (e.g. an inverted clear range)
    #[error("invalid mutation: {0}")]
    InvalidMutation(String),
}

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for batchlog_core::Error {
    fn from(e: StoreError) -> Self {
        batchlog_core::Error::Storage(e.to_string())
    }
}
