//! Core types for batchlog
//!
//! This crate defines the vocabulary shared by every layer:
//! - [`Error`]: the commit log error taxonomy
//! - [`Namespace`]: the key prefix that scopes one log inside a store
//! - [`ChunkKey`]: an ordered, byte-comparable key for one persisted chunk

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{decode_high_water, encode_high_water, ChunkKey, Namespace};
