//! Truncation tokens and range clearing
//!
//! A [`TruncationToken`] names a durable position. It can only be obtained
//! from the log itself: from a completed write
//! ([`CommitLog::write_with_token`](crate::CommitLog::write_with_token)) or
//! from a replayed chunk ([`LogChunk::truncation_token`](crate::LogChunk::truncation_token)).
//! Callers cannot build one from arbitrary bytes.
//!
//! Deciding that a position is safe to drop belongs to the caller. The log
//! executes the clear and checks nothing beyond the token's namespace.

use batchlog_core::{ChunkKey, Error, Namespace, Result};
use batchlog_storage::{OrderedStore, Transaction};
use std::fmt;

/// Opaque durable position; truncating with it clears every chunk up to
/// and including the chunk it was taken from.
///
/// Tokens are ordered: a greater token subsumes a smaller one.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TruncationToken {
    /// Exclusive end of the range to clear
    up_to: ChunkKey,
}

impl TruncationToken {
    /// Token clearing `key` and everything before it.
    pub(crate) fn through(key: &ChunkKey) -> Self {
        // The sequencer never issues u64::MAX, so a successor exists for
        // every key this log wrote.
        let up_to = key.successor().unwrap_or_else(|| key.clone());
        Self { up_to }
    }

    /// Sequence of the first chunk the token keeps
    pub fn retained_from(&self) -> u64 {
        self.up_to.sequence()
    }

    /// Reject a token taken from a different log.
    pub(crate) fn check_namespace(&self, namespace: &Namespace) -> Result<()> {
        if namespace.contains(self.up_to.as_bytes()) {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "truncation token {} does not belong to namespace {}",
                self.up_to, namespace
            )))
        }
    }
}

impl fmt::Debug for TruncationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TruncationToken(up_to={})", self.up_to)
    }
}

/// Clear `[namespace start, token.up_to)` in one transaction.
///
/// Clearing an already-cleared range is a no-op, so repeating a token, or
/// applying one subsumed by an earlier truncation, changes nothing.
pub(crate) fn truncate<S: OrderedStore>(
    store: &S,
    namespace: &Namespace,
    token: &TruncationToken,
) -> Result<()> {
    token.check_namespace(namespace)?;
    let mut txn = Transaction::with_capacity(1);
    txn.clear_range(namespace.start_key(), token.up_to.as_bytes());
    store.commit(txn)?;
    Ok(())
}
