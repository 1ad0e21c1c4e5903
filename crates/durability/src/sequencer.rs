//! Key sequencer
//!
//! Issues the keys persisted chunks are stored under. Keys come from a local
//! `u64` counter, never the wall clock, so they are strictly increasing no
//! matter how the system clock behaves.
//!
//! The sequencer is owned by the flush worker and takes `&mut self`: a
//! single issuer needs no atomics to stay monotonic.
//!
//! # Sequence Gaps
//!
//! Keys issued for a transaction that then fails are not handed out again.
//! Readers must not assume sequences are contiguous.
//!
//! # High-Water Mark
//!
//! Every flush transaction also stores the next sequence under the
//! namespace's high-water key. Truncation never clears that key, so a log
//! reopened after its whole history was truncated still issues keys past
//! every token handed out before. Reapplying such a token stays a no-op.

use batchlog_core::{decode_high_water, encode_high_water, ChunkKey, Error, Namespace, Result};
use batchlog_storage::OrderedStore;

#[derive(Debug)]
pub(crate) struct KeySequencer {
    namespace: Namespace,
    next: u64,
}

impl KeySequencer {
    pub(crate) fn new(namespace: Namespace, next: u64) -> Self {
        Self { namespace, next }
    }

    /// Seed from the store: past the highest surviving chunk and past the
    /// persisted high-water mark, whichever is further.
    ///
    /// # Errors
    ///
    /// [`Error::Storage`] if a read fails, or the namespace holds a key or
    /// high-water value this log could not have written.
    pub(crate) fn recover<S: OrderedStore>(store: &S, namespace: Namespace) -> Result<Self> {
        let after_chunks = Self::after_last_chunk(store, &namespace)?;
        let high_water = match store.read(&namespace.high_water_key())? {
            None => 0,
            Some(raw) => decode_high_water(&raw).ok_or_else(|| {
                Error::storage(format!(
                    "malformed high-water mark in commit log namespace {}: {:?}",
                    namespace, raw
                ))
            })?,
        };
        Ok(Self::new(namespace, after_chunks.max(high_water)))
    }

    fn after_last_chunk<S: OrderedStore>(store: &S, namespace: &Namespace) -> Result<u64> {
        let last = store.last_key(&namespace.start_key(), &namespace.end_key())?;
        let next = match last {
            None => 0,
            Some(raw) => {
                let key = namespace.decode(&raw).ok_or_else(|| {
                    Error::storage(format!(
                        "malformed key in commit log namespace {}: {:?}",
                        namespace, raw
                    ))
                })?;
                key.sequence()
                    .checked_add(1)
                    .ok_or_else(|| Error::storage("commit log key space exhausted"))?
            }
        };
        Ok(next)
    }

    /// Issue the next key.
    pub(crate) fn next_key(&mut self) -> Result<ChunkKey> {
        let key = self.namespace.key(self.next);
        self.next = self
            .next
            .checked_add(1)
            .ok_or_else(|| Error::storage("commit log key space exhausted"))?;
        Ok(key)
    }

    /// Sequence the next issued key will carry
    pub(crate) fn next_sequence(&self) -> u64 {
        self.next
    }

    /// High-water key and value to store alongside the keys issued so far.
    pub(crate) fn high_water(&self) -> (Vec<u8>, Vec<u8>) {
        (self.namespace.high_water_key(), encode_high_water(self.next))
    }
}
