//! Recovery Tests
//!
//! A new log over a store that already holds history replays it and keeps
//! issuing keys after it.

use crate::*;

#[test]
fn test_replay_after_restart() {
    let store = Arc::new(MemoryStore::new());
    let log = open_log(&store);
    log.write(b"alpha").unwrap();
    log.write(b"beta").unwrap();
    // Dropped without an explicit close
    drop(log);

    let restarted = small_builder().build(Arc::clone(&store)).unwrap();
    let chunks = restarted.replay().unwrap();
    assert_eq!(stream(&chunks), b"alphabeta");
    assert_strictly_increasing(&keys(&chunks));
}

#[test]
fn test_keys_continue_after_reopen() {
    let store = Arc::new(MemoryStore::new());
    let first = open_log(&store);
    first.write(b"a").unwrap();
    first.write(b"b").unwrap();
    first.close().unwrap();
    let high_water = first.replay().unwrap().last().map(|c| c.key.clone()).unwrap();

    let second = open_log(&store);
    let token = second.write_with_token(b"c").unwrap();
    assert!(token.retained_from() > high_water.sequence() + 1);

    let chunks = second.replay().unwrap();
    assert_eq!(stream(&chunks), b"abc");
    assert_strictly_increasing(&keys(&chunks));
    second.close().unwrap();
}

#[test]
fn test_keys_continue_after_partial_truncation() {
    let store = Arc::new(MemoryStore::new());
    let first = open_log(&store);
    let token = first.write_with_token(b"applied").unwrap();
    first.write(b"pending").unwrap();
    first.truncate(&token).unwrap();
    first.close().unwrap();
    let survivor = first.replay().unwrap()[0].key.clone();

    let second = open_log(&store);
    second.write(b"new").unwrap();
    let chunks = second.replay().unwrap();
    assert_eq!(chunks[0].key, survivor);
    assert_eq!(stream(&chunks), b"pendingnew");
    assert_strictly_increasing(&keys(&chunks));
    second.close().unwrap();
}

#[test]
fn test_replay_then_truncate_workflow() {
    let store = Arc::new(MemoryStore::new());
    {
        let log = open_log(&store);
        for i in 0..5u8 {
            log.write(&[b'0' + i]).unwrap();
        }
        log.close().unwrap();
    }

    let log = small_builder().build(Arc::clone(&store)).unwrap();
    let mut applied = Vec::new();
    let history = log.replay().unwrap();
    for chunk in &history {
        applied.extend_from_slice(&chunk.data);
    }
    assert_eq!(applied, b"01234");

    log.open().unwrap();
    if let Some(last) = history.last() {
        log.truncate(&last.truncation_token()).unwrap();
    }
    assert!(log.replay().unwrap().is_empty());
    log.close().unwrap();
}

#[test]
fn test_stale_token_after_full_truncation_keeps_new_history() {
    let store = Arc::new(MemoryStore::new());
    let first = open_log(&store);
    first.write(b"old-0").unwrap();
    let stale = first.write_with_token(b"old-1").unwrap();
    let old_keys = keys(&first.replay().unwrap());
    first.truncate(&stale).unwrap();
    assert!(first.replay().unwrap().is_empty());
    first.close().unwrap();

    // Nothing left in the chunk range; keys must still move forward
    let second = open_log(&store);
    second.write(b"new-durable").unwrap();
    second.truncate(&stale).unwrap();

    let chunks = second.replay().unwrap();
    assert_eq!(stream(&chunks), b"new-durable");
    let newest_old = old_keys.last().map(ChunkKey::sequence).unwrap();
    assert!(keys(&chunks).iter().all(|k| k.sequence() > newest_old));
    second.close().unwrap();
}

#[test]
fn test_corrupt_key_fails_open() {
    use batchlog::{OrderedStore, Transaction};

    let store = Arc::new(MemoryStore::new());
    let log = small_builder().build(Arc::clone(&store)).unwrap();
    let mut raw = log.namespace().start_key();
    raw.extend_from_slice(b"not-a-sequence");
    let mut txn = Transaction::new();
    txn.set(raw, b"?".to_vec());
    store.commit(txn).unwrap();

    assert!(log.open().unwrap_err().is_storage());
    assert!(log.replay().unwrap_err().is_storage());
    assert_eq!(log.status(), batchlog::LogStatus::Unopened);
}
