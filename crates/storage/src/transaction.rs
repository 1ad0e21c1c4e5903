//! Transaction mutation batch
//!
//! A [`Transaction`] is built up front and handed to
//! [`OrderedStore::commit`](crate::OrderedStore::commit) in one piece. There is
//! no interactive read-your-writes; the commit log never needs it.

/// One buffered store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Insert or overwrite `key`
    Set {
        /// Key to write
        key: Vec<u8>,
        /// Value to store
        value: Vec<u8>,
    },
    /// Remove every key with `begin <= key < end`
    ClearRange {
        /// Inclusive start
        begin: Vec<u8>,
        /// Exclusive end
        end: Vec<u8>,
    },
}

/// Ordered set of mutations committed atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    mutations: Vec<Mutation>,
}

impl Transaction {
    /// Create an empty transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transaction with room for `capacity` mutations
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mutations: Vec::with_capacity(capacity),
        }
    }

    /// Buffer a write of `value` under `key`.
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.mutations.push(Mutation::Set {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Buffer a clear of `[begin, end)`.
    ///
    /// An empty or inverted range clears nothing.
    pub fn clear_range(&mut self, begin: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) {
        self.mutations.push(Mutation::ClearRange {
            begin: begin.into(),
            end: end.into(),
        });
    }

    /// Number of buffered mutations
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Buffered mutations in insertion order
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Consume into the buffered mutations
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}
