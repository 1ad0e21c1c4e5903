//! Storage Failure Tests
//!
//! A failed batch transaction is reported to every writer in the batch and
//! the batch is dropped: nothing is retried or re-buffered.

use crate::*;
use batchlog::Error;
use std::sync::Barrier;

#[test]
fn test_failure_reaches_every_writer_in_batch() {
    const NUM_WRITERS: usize = 4;

    let store = Arc::new(MemoryStore::new());
    let (log, clock) = held_log(&store, small_builder());
    let log = Arc::new(log);

    let barrier = Arc::new(Barrier::new(NUM_WRITERS));
    let handles: Vec<_> = (0..NUM_WRITERS)
        .map(|i| {
            let log = Arc::clone(&log);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                log.write(format!("w{}", i).as_bytes())
            })
        })
        .collect();

    wait_until("all writes buffered", || log.pending_bytes() == 2 * NUM_WRITERS);
    store.fail_next_commits(1);
    clock.advance(TICK);

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for result in &results {
        let err = result.as_ref().unwrap_err();
        assert!(err.is_storage(), "got {:?}", err);
        assert!(!err.is_synchronous());
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]), "same error for all");

    // Dropped, not retried
    assert_eq!(stream(&log.replay().unwrap()), WARMUP);
    assert_eq!(log.pending_bytes(), 0);
}

#[test]
fn test_log_keeps_working_after_failed_batch() {
    let store = Arc::new(MemoryStore::new());
    let (log, _clock) = held_log(&store, small_builder());

    let lost = log.submit(b"lost").unwrap();
    store.fail_next_commits(1);
    let err = log.flush().unwrap_err();
    assert!(err.is_storage());
    assert_eq!(lost.wait().unwrap_err(), err);

    let kept = log.submit(b"kept").unwrap();
    log.flush().unwrap();
    let key = kept.wait().unwrap();

    let chunks = log.replay().unwrap();
    assert_eq!(chunks.last().map(|c| c.key.clone()), Some(key));
    let mut expected = WARMUP.to_vec();
    expected.extend_from_slice(b"kept");
    assert_eq!(stream(&chunks), expected);
    assert_strictly_increasing(&keys(&chunks));
}

/// Keys burned by a failed transaction are not reused, so history has a
/// gap in its sequences rather than a reordering.
#[test]
fn test_failed_batch_leaves_sequence_gap() {
    let store = Arc::new(MemoryStore::new());
    let (log, _clock) = held_log(&store, small_builder());
    let before = log.replay().unwrap().last().map(|c| c.key.sequence()).unwrap();

    log.submit(b"lost").unwrap();
    store.fail_next_commits(1);
    assert!(log.flush().is_err());

    log.submit(b"kept").unwrap();
    log.flush().unwrap();
    let after = log.replay().unwrap().last().map(|c| c.key.sequence()).unwrap();
    assert_eq!(after, before + 2);
}

#[test]
fn test_close_runs_exactly_one_final_flush() {
    let store = Arc::new(MemoryStore::new());
    let (log, _clock) = held_log(&store, small_builder());

    let a = log.submit(b"tail-a").unwrap();
    let b = log.submit(b"tail-b").unwrap();
    let commits = store.commit_count();

    log.close().unwrap();
    assert_eq!(store.commit_count(), commits + 1);
    assert_eq!(a.wait().unwrap(), b.wait().unwrap());

    assert!(log.write(b"after").unwrap_err().is_usage());
    let mut expected = WARMUP.to_vec();
    expected.extend_from_slice(b"tail-atail-b");
    assert_eq!(stream(&log.replay().unwrap()), expected);
}

#[test]
fn test_close_with_nothing_pending_commits_nothing() {
    let store = Arc::new(MemoryStore::new());
    let (log, _clock) = held_log(&store, small_builder());
    let commits = store.commit_count();
    log.close().unwrap();
    assert_eq!(store.commit_count(), commits);
}

#[test]
fn test_failed_final_flush_is_reported_by_close() {
    let store = Arc::new(MemoryStore::new());
    let (log, _clock) = held_log(&store, small_builder());
    let pending = log.submit(b"doomed").unwrap();
    store.fail_next_commits(1);

    let err = log.close().unwrap_err();
    assert!(matches!(err, Error::ShutdownFlush(_)), "got {:?}", err);
    assert!(pending.wait().unwrap_err().is_storage());

    // Closed regardless
    assert!(log.write(b"x").unwrap_err().is_usage());
    assert_eq!(stream(&log.replay().unwrap()), WARMUP);
}
