//! Lifecycle Tests
//!
//! Unopened → Open → Closed, each transition at most once.

use crate::*;
use batchlog::{CommitLogConfig, Error, LogStatus};

#[test]
fn test_new_log_is_unopened() {
    let store = Arc::new(MemoryStore::new());
    let log = CommitLog::new(store, CommitLogConfig::default()).unwrap();
    assert_eq!(log.status(), LogStatus::Unopened);
    assert_eq!(log.pending_bytes(), 0);
    assert_eq!(log.namespace().as_bytes(), b"commitlog");
}

#[test]
fn test_open_then_close() {
    let store = Arc::new(MemoryStore::new());
    let log = open_log(&store);
    assert_eq!(log.status(), LogStatus::Open);

    log.close().unwrap();
    assert_eq!(log.status(), LogStatus::Closed);
}

#[test]
fn test_open_twice_is_usage_error() {
    let store = Arc::new(MemoryStore::new());
    let log = open_log(&store);
    let err = log.open().unwrap_err();
    assert!(err.is_usage(), "got {:?}", err);
    assert_eq!(log.status(), LogStatus::Open, "failed open leaves state alone");
    log.close().unwrap();
}

#[test]
fn test_no_reopen_after_close() {
    let store = Arc::new(MemoryStore::new());
    let log = open_log(&store);
    log.close().unwrap();
    assert!(log.open().unwrap_err().is_usage());
    assert_eq!(log.status(), LogStatus::Closed);
}

#[test]
fn test_close_requires_open() {
    let store = Arc::new(MemoryStore::new());
    let log = small_builder().build(Arc::clone(&store)).unwrap();
    assert!(log.close().unwrap_err().is_usage());

    log.open().unwrap();
    log.close().unwrap();
    assert!(log.close().unwrap_err().is_usage());
}

#[test]
fn test_write_before_open_is_usage_error() {
    let store = Arc::new(MemoryStore::new());
    let log = small_builder().build(Arc::clone(&store)).unwrap();
    assert!(log.write(b"early").unwrap_err().is_usage());
    assert!(log.submit(b"early").unwrap_err().is_usage());
    assert!(log.flush().unwrap_err().is_usage());
    assert!(store.is_empty());
}

#[test]
fn test_write_after_close_is_usage_error() {
    let store = Arc::new(MemoryStore::new());
    let log = open_log(&store);
    log.write(b"kept").unwrap();
    log.close().unwrap();

    let err = log.write(b"late").unwrap_err();
    assert!(matches!(err, Error::Usage(_)), "got {:?}", err);
    assert_eq!(stream(&log.replay().unwrap()), b"kept");
}

#[test]
fn test_empty_write_is_validation_error_in_any_state() {
    let store = Arc::new(MemoryStore::new());
    let log = small_builder().build(Arc::clone(&store)).unwrap();
    assert!(log.write(b"").unwrap_err().is_validation());

    log.open().unwrap();
    assert!(log.write(b"").unwrap_err().is_validation());
    assert_eq!(log.pending_bytes(), 0);
    log.close().unwrap();
}

#[test]
fn test_replay_allowed_in_every_state() {
    let store = Arc::new(MemoryStore::new());
    let log = small_builder().build(Arc::clone(&store)).unwrap();
    assert!(log.replay().unwrap().is_empty());

    log.open().unwrap();
    log.write(b"abc").unwrap();
    assert_eq!(stream(&log.replay().unwrap()), b"abc");

    log.close().unwrap();
    assert_eq!(stream(&log.replay().unwrap()), b"abc");
}

#[test]
fn test_drop_flushes_pending_writes() {
    let store = Arc::new(MemoryStore::new());
    let (log, _clock) = held_log(&store, small_builder());
    let pending = log.submit(b"tail").unwrap();
    assert!(!pending.is_resolved());

    drop(log);
    assert!(pending.wait().is_ok());

    let reader = small_builder().build(Arc::clone(&store)).unwrap();
    let mut expected = WARMUP.to_vec();
    expected.extend_from_slice(b"tail");
    assert_eq!(stream(&reader.replay().unwrap()), expected);
}

#[test]
fn test_config_round_trips_through_builder() {
    let store = Arc::new(MemoryStore::new());
    let log = CommitLogBuilder::new()
        .namespace("orders")
        .ideal_batch_size(512)
        .max_pending_bytes(2048)
        .flush_interval(Duration::from_millis(3))
        .build(store)
        .unwrap();

    let config = log.config();
    assert_eq!(config.namespace, "orders");
    assert_eq!(config.ideal_batch_size, 512);
    assert_eq!(config.max_pending_bytes, 2048);
    assert_eq!(config.flush_interval, Duration::from_millis(3));
}

#[test]
fn test_invalid_namespace_rejected() {
    let store = Arc::new(MemoryStore::new());
    let err = CommitLogBuilder::new().namespace("").build(Arc::clone(&store)).unwrap_err();
    assert!(err.is_validation());
    let err = CommitLogBuilder::new().namespace("a\0b").build(store).unwrap_err();
    assert!(err.is_validation());
}
