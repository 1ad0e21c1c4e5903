//! Replay of durable history
//!
//! After a crash the consuming engine re-reads every chunk that survived,
//! applies it to primary state, then truncates through what it applied.

use batchlog_core::{ChunkKey, Error, Namespace, Result};
use batchlog_storage::OrderedStore;

use crate::truncation::TruncationToken;

/// One persisted chunk, as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogChunk {
    /// Key the chunk was stored under
    pub key: ChunkKey,
    /// Chunk bytes (at most `ideal_batch_size`)
    pub data: Vec<u8>,
}

impl LogChunk {
    /// Token that clears this chunk and every chunk before it.
    pub fn truncation_token(&self) -> TruncationToken {
        TruncationToken::through(&self.key)
    }
}

/// Read every chunk of `namespace` in key (= write) order.
pub(crate) fn replay<S: OrderedStore>(store: &S, namespace: &Namespace) -> Result<Vec<LogChunk>> {
    let pairs = store.scan(&namespace.start_key(), &namespace.end_key())?;
    let mut chunks = Vec::with_capacity(pairs.len());
    for (raw, data) in pairs {
        let key = namespace.decode(&raw).ok_or_else(|| {
            Error::storage(format!(
                "malformed key in commit log namespace {}: {:?}",
                namespace, raw
            ))
        })?;
        chunks.push(LogChunk { key, data });
    }
    tracing::debug!(namespace = %namespace, chunks = chunks.len(), "replayed commit log");
    Ok(chunks)
}
