//! In-memory ordered store
//!
//! `MemoryStore` keeps every pair in a single `BTreeMap` behind a
//! `parking_lot::RwLock`. A commit takes the write lock once and applies
//! all mutations of the transaction under it, which is what makes the
//! transaction atomic for concurrent readers.
//!
//! The store can be told to fail the next N commits. This is how tests
//! exercise the commit log's storage-failure path without a real network
//! fault.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::{StoreError, StoreResult};
use crate::traits::{KvPair, OrderedStore};
use crate::transaction::{Mutation, Transaction};

/// BTreeMap-backed [`OrderedStore`].
///
/// # Example
///
/// ```
/// use batchlog_storage::{MemoryStore, OrderedStore, Transaction};
///
/// let store = MemoryStore::new();
/// let mut txn = Transaction::new();
/// txn.set(b"a".to_vec(), b"1".to_vec());
/// store.commit(txn).unwrap();
/// assert_eq!(store.get(b"a"), Some(b"1".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// Commits still to be rejected
    fail_commits: AtomicUsize,
    /// Successfully applied transactions
    commits: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` commits with [`StoreError::CommitFailed`].
    ///
    /// Rejected transactions leave the store untouched.
    pub fn fail_next_commits(&self, n: usize) {
        self.fail_commits.store(n, Ordering::SeqCst);
    }

    /// Number of transactions applied so far
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Read a single key
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Total number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of every pair, in key order
    pub fn entries(&self) -> Vec<KvPair> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn range_bounds<'a>(begin: &'a [u8], end: &'a [u8]) -> (Bound<&'a [u8]>, Bound<&'a [u8]>) {
    (Bound::Included(begin), Bound::Excluded(end))
}

impl OrderedStore for MemoryStore {
    fn commit(&self, txn: Transaction) -> StoreResult<()> {
        if self.take_injected_failure() {
            tracing::debug!(mutations = txn.len(), "rejecting commit (injected failure)");
            return Err(StoreError::CommitFailed("injected failure".to_string()));
        }

        let mut data = self.data.write();
        for mutation in txn.into_mutations() {
            match mutation {
                Mutation::Set { key, value } => {
                    data.insert(key, value);
                }
                Mutation::ClearRange { begin, end } => {
                    if begin >= end {
                        continue;
                    }
                    let doomed: Vec<Vec<u8>> = data
                        .range::<[u8], _>(range_bounds(&begin, &end))
                        .map(|(k, _)| k.clone())
                        .collect();
                    for key in doomed {
                        data.remove(&key);
                    }
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn scan(&self, begin: &[u8], end: &[u8]) -> StoreResult<Vec<KvPair>> {
        if begin >= end {
            return Ok(Vec::new());
        }
        Ok(self
            .data
            .read()
            .range::<[u8], _>(range_bounds(begin, end))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn last_key(&self, begin: &[u8], end: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        if begin >= end {
            return Ok(None);
        }
        Ok(self
            .data
            .read()
            .range::<[u8], _>(range_bounds(begin, end))
            .next_back()
            .map(|(k, _)| k.clone()))
    }

    fn read(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.get(key))
    }
}
