//! Commit log configuration
//!
//! | Field | Default | Meaning |
//! |-------|---------|---------|
//! | `ideal_batch_size` | 4096 bytes | Max bytes per persisted chunk |
//! | `max_pending_bytes` | 10,000,000 bytes | Ceiling on buffered, not-yet-durable bytes |
//! | `flush_interval` | 1ms | Minimum spacing between flush attempts |
//! | `namespace` | `"commitlog"` | Key prefix of the log inside the store |
//!
//! Durability latency is bounded by `flush_interval`: a write waits at most
//! one interval (plus the transaction) before its batch is swapped out.

use batchlog_core::{Error, Namespace, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default max bytes per persisted chunk (one page)
pub const DEFAULT_IDEAL_BATCH_SIZE: usize = 4096;
/// Default ceiling on buffered-but-undurable bytes
pub const DEFAULT_MAX_PENDING_BYTES: usize = 10_000_000;
/// Default minimum spacing between flush attempts
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1);
/// Default key prefix
pub const DEFAULT_NAMESPACE: &str = "commitlog";

/// Commit log tuning knobs.
///
/// Deserializes with missing fields filled from the defaults, so a host
/// config file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitLogConfig {
    /// Max bytes per persisted chunk
    pub ideal_batch_size: usize,
    /// Ceiling on buffered, not-yet-durable bytes
    pub max_pending_bytes: usize,
    /// Minimum spacing between flush attempts
    pub flush_interval: Duration,
    /// Key prefix of this log
    pub namespace: String,
}

impl Default for CommitLogConfig {
    fn default() -> Self {
        Self {
            ideal_batch_size: DEFAULT_IDEAL_BATCH_SIZE,
            max_pending_bytes: DEFAULT_MAX_PENDING_BYTES,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl CommitLogConfig {
    /// Check the configuration and build its [`Namespace`].
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if a size or the interval is zero, or the
    /// namespace is empty or contains NUL.
    pub fn validate(&self) -> Result<Namespace> {
        if self.ideal_batch_size == 0 {
            return Err(Error::validation("ideal_batch_size must be positive"));
        }
        if self.max_pending_bytes == 0 {
            return Err(Error::validation("max_pending_bytes must be positive"));
        }
        if self.flush_interval.is_zero() {
            return Err(Error::validation("flush_interval must be positive"));
        }
        Namespace::new(self.namespace.as_bytes())
    }
}
