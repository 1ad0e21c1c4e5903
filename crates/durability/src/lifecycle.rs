//! Commit log lifecycle
//!
//! ```text
//! Unopened ──open()──► Open ──close()──► Closed
//! ```
//!
//! There is no way back. Each transition happens at most once and is
//! checked under the accumulator lock, the same lock `write` takes, so a
//! write can never slip in after the final flush has been scheduled.

use batchlog_core::{Error, Result};
use std::fmt;

/// Lifecycle state of a commit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStatus {
    /// Constructed, worker not started
    Unopened,
    /// Accepting writes
    Open,
    /// Shut down; only replay is allowed
    Closed,
}

impl LogStatus {
    /// Validate `Unopened → Open`.
    pub(crate) fn check_open(self) -> Result<()> {
        match self {
            LogStatus::Unopened => Ok(()),
            _ => Err(Error::usage("commit log cannot be opened more than once")),
        }
    }

    /// Validate `Open → Closed`.
    pub(crate) fn check_close(self) -> Result<()> {
        match self {
            LogStatus::Open => Ok(()),
            other => Err(Error::usage(format!(
                "cannot close commit log that is not open ({})",
                other
            ))),
        }
    }

    /// Validate that `op` may run in this state.
    pub(crate) fn require_open(self, op: &str) -> Result<()> {
        match self {
            LogStatus::Open => Ok(()),
            other => Err(Error::usage(format!(
                "cannot {} commit log that is not open ({})",
                op, other
            ))),
        }
    }

    /// Check if the log accepts writes
    pub fn is_open(self) -> bool {
        self == LogStatus::Open
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStatus::Unopened => write!(f, "unopened"),
            LogStatus::Open => write!(f, "open"),
            LogStatus::Closed => write!(f, "closed"),
        }
    }
}
