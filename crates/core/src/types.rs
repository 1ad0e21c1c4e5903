//! Key types for persisted chunks
//!
//! A log lives in one [`Namespace`] of the backing store. Every chunk it
//! persists is stored under a [`ChunkKey`]:
//!
//! ```text
//! +------------------+------+---------------------+
//! | namespace prefix | 0x00 | sequence (u64, BE)  |
//! +------------------+------+---------------------+
//! ```
//!
//! The prefix may not contain `0x00`, so the separator makes namespaces
//! prefix-free: `"log"` and `"log2"` occupy disjoint key ranges. The
//! big-endian sequence makes byte order equal numeric order.
//!
//! Next to the chunk range sits one high-water key, `prefix | 0x01`,
//! holding the next sequence to issue. It lies past every chunk key, so
//! scans and truncation never touch it, and it survives truncating the
//! whole log.

use byteorder::{BigEndian, ByteOrder};
use std::fmt;

use crate::error::{Error, Result};

const SEPARATOR: u8 = 0x00;
const SEQUENCE_LEN: usize = 8;

/// Key prefix scoping one commit log inside a shared store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(Vec<u8>);

impl Namespace {
    /// Create a namespace from a prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the prefix is empty or contains a
    /// NUL byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use batchlog_core::Namespace;
    ///
    /// let ns = Namespace::new("commitlog").unwrap();
    /// assert_eq!(ns.as_bytes(), b"commitlog");
    /// assert!(Namespace::new("").is_err());
    /// ```
    pub fn new(prefix: impl Into<Vec<u8>>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(Error::validation("namespace must not be empty"));
        }
        if prefix.contains(&SEPARATOR) {
            return Err(Error::validation("namespace must not contain a NUL byte"));
        }
        Ok(Namespace(prefix))
    }

    /// Raw prefix bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// First key of the namespace range (inclusive).
    pub fn start_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.0.len() + 1);
        key.extend_from_slice(&self.0);
        key.push(SEPARATOR);
        key
    }

    /// End of the namespace range (exclusive).
    pub fn end_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.0.len() + 1);
        key.extend_from_slice(&self.0);
        key.push(SEPARATOR + 1);
        key
    }

    /// Key storing the next sequence this namespace will issue.
    ///
    /// Equal to [`end_key`](Namespace::end_key), which is exclusive, so it
    /// is never part of the chunk range.
    pub fn high_water_key(&self) -> Vec<u8> {
        self.end_key()
    }

    /// Whether `key` falls inside this namespace's range.
    pub fn contains(&self, key: &[u8]) -> bool {
        key.len() > self.0.len() && key.starts_with(&self.0) && key[self.0.len()] == SEPARATOR
    }

    /// Build the key for `sequence` in this namespace.
    pub fn key(&self, sequence: u64) -> ChunkKey {
        let mut encoded = self.start_key();
        let offset = encoded.len();
        encoded.resize(offset + SEQUENCE_LEN, 0);
        BigEndian::write_u64(&mut encoded[offset..], sequence);
        ChunkKey { encoded, sequence }
    }

    /// Decode a stored key back into a [`ChunkKey`].
    ///
    /// Returns `None` if the key does not belong to this namespace or does
    /// not carry an 8-byte sequence.
    pub fn decode(&self, key: &[u8]) -> Option<ChunkKey> {
        if !self.contains(key) {
            return None;
        }
        let tail = &key[self.0.len() + 1..];
        if tail.len() != SEQUENCE_LEN {
            return None;
        }
        Some(ChunkKey {
            encoded: key.to_vec(),
            sequence: BigEndian::read_u64(tail),
        })
    }
}

/// Encode a high-water sequence as stored under
/// [`Namespace::high_water_key`].
pub fn encode_high_water(next: u64) -> Vec<u8> {
    let mut value = vec![0; SEQUENCE_LEN];
    BigEndian::write_u64(&mut value, next);
    value
}

/// Decode a stored high-water value. `None` unless it is exactly 8 bytes.
pub fn decode_high_water(value: &[u8]) -> Option<u64> {
    if value.len() != SEQUENCE_LEN {
        return None;
    }
    Some(BigEndian::read_u64(value))
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Encoded key of one persisted chunk.
///
/// Ordering compares the encoded bytes, which matches sequence order for
/// keys of the same namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    encoded: Vec<u8>,
    sequence: u64,
}

impl ChunkKey {
    /// Sequence number assigned by the issuing sequencer
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Encoded key bytes as stored
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    /// Consume into the encoded key bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.encoded
    }

    /// The smallest key strictly greater than this one in the same namespace.
    ///
    /// Returns `None` when the sequence space is exhausted.
    pub fn successor(&self) -> Option<ChunkKey> {
        let sequence = self.sequence.checked_add(1)?;
        let mut encoded = self.encoded.clone();
        let offset = encoded.len() - SEQUENCE_LEN;
        BigEndian::write_u64(&mut encoded[offset..], sequence);
        Some(ChunkKey { encoded, sequence })
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = &self.encoded[..self.encoded.len() - SEQUENCE_LEN - 1];
        write!(f, "{}/{}", String::from_utf8_lossy(prefix), self.sequence)
    }
}
