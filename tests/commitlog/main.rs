//! Commit Log Integration Tests
//!
//! End-to-end tests of `CommitLog` over `MemoryStore`:
//! - Lifecycle transitions and the operations each state allows
//! - Group commit: shared outcomes, capacity, append order under contention
//! - Storage failures: delivery to every writer, drop without retry
//! - Truncation tokens
//! - Replay and key recovery across incarnations
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test commitlog
//!
//! # Group commit tests only
//! cargo test --test commitlog group_commit::
//! ```

use batchlog::{
    ChunkKey, CommitLog, CommitLogBuilder, LogChunk, ManualClock, MemoryStore,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Test modules
mod failure;
mod lifecycle;
mod recovery;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Payload used to get the first flush out of the way.
///
/// The first batch of a log is flushed on the next worker tick; after that a
/// frozen clock holds every batch until it is advanced or flushed.
pub const WARMUP: &[u8] = b"warmup";

/// Interval used by logs driven by a `ManualClock`
pub const TICK: Duration = Duration::from_millis(1);

/// Route log output to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Builder with small limits so chunking shows up in short tests
pub fn small_builder() -> CommitLogBuilder {
    CommitLogBuilder::new()
        .ideal_batch_size(16)
        .max_pending_bytes(1024)
        .flush_interval(TICK)
}

/// Open a log on the real clock
pub fn open_log(store: &Arc<MemoryStore>) -> CommitLog<MemoryStore> {
    init_tracing();
    let log = small_builder().build(Arc::clone(store)).unwrap();
    log.open().unwrap();
    log
}

/// Open a log on a frozen clock and flush `WARMUP`.
///
/// The builder's flush interval is also the worker's real-time tick. On return no batch flushes until the clock advances or `flush` is called.
pub fn held_log(
    store: &Arc<MemoryStore>,
    builder: CommitLogBuilder,
) -> (CommitLog<MemoryStore>, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new());
    let log = builder
        .clock(clock.clone())
        .build(Arc::clone(store))
        .unwrap();
    log.open().unwrap();
    log.write(WARMUP).unwrap();
    (log, clock)
}

/// Concatenate replayed chunks back into the appended byte stream
pub fn stream(chunks: &[LogChunk]) -> Vec<u8> {
    chunks.iter().flat_map(|c| c.data.iter().copied()).collect()
}

/// Keys of replayed chunks, in replay order
pub fn keys(chunks: &[LogChunk]) -> Vec<ChunkKey> {
    chunks.iter().map(|c| c.key.clone()).collect()
}

/// Assert keys sort strictly ascending, both as values and as raw bytes
pub fn assert_strictly_increasing(keys: &[ChunkKey]) {
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        assert!(pair[0].as_bytes() < pair[1].as_bytes());
        assert!(pair[0].sequence() < pair[1].sequence());
    }
}

/// Spin until `cond` holds, failing the test after a generous deadline
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(1));
    }
}
