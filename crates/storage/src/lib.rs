//! Storage layer for batchlog
//!
//! This crate defines the contract the commit log expects from its backing
//! store and ships an in-memory implementation:
//! - [`OrderedStore`]: byte-ordered key-value store with atomic transactions
//! - [`Transaction`]: all-or-nothing batch of `set` / `clear_range` mutations
//! - [`MemoryStore`]: BTreeMap-based store with RwLock and fault injection

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod memory;
pub mod traits;
pub mod transaction;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::{KvPair, OrderedStore};
pub use transaction::{Mutation, Transaction};
