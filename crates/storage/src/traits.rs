//! The backing store contract
//!
//! The commit log treats its store as a black box with two guarantees:
//! transactions commit entirely or not at all, and keys compare by byte
//! order. Anything meeting that contract (FoundationDB, an LSM with write
//! batches, the bundled [`MemoryStore`](crate::MemoryStore)) can sit behind
//! a log.

use crate::error::StoreResult;
use crate::transaction::Transaction;

/// A key-value pair read from the store.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Byte-ordered key-value store with atomic multi-key transactions.
///
/// # Thread Safety
///
/// Implementations must be shareable across threads: the flush worker
/// commits while readers may scan concurrently.
pub trait OrderedStore: Send + Sync + 'static {
    /// Apply every mutation of `txn` atomically.
    ///
    /// Mutations apply in the order they were added. On error none of them
    /// may be visible.
    fn commit(&self, txn: Transaction) -> StoreResult<()>;

    /// Read all pairs with `begin <= key < end`, in ascending key order.
    fn scan(&self, begin: &[u8], end: &[u8]) -> StoreResult<Vec<KvPair>>;

    /// Greatest key with `begin <= key < end`, if any.
    fn last_key(&self, begin: &[u8], end: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Value stored under exactly `key`, if any.
    fn read(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;
}

impl<S: OrderedStore> OrderedStore for std::sync::Arc<S> {
    fn commit(&self, txn: Transaction) -> StoreResult<()> {
        (**self).commit(txn)
    }

    fn scan(&self, begin: &[u8], end: &[u8]) -> StoreResult<Vec<KvPair>> {
        (**self).scan(begin, end)
    }

    fn last_key(&self, begin: &[u8], end: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).last_key(begin, end)
    }

    fn read(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).read(key)
    }
}
