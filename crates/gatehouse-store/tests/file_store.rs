//! Integration tests for the directory-backed store.

use std::sync::Arc;

use gatehouse_protocol::{IdentityRecord, Username};
use gatehouse_store::{FileStore, StateStore, StoreError};

fn record(name: &str) -> IdentityRecord {
    IdentityRecord::registered(
        Username::new(name),
        format!("salt-{name}"),
        format!("hash-{name}"),
    )
}

#[tokio::test]
async fn test_load_missing_record_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();

    let loaded = store.load(&Username::new("nobody")).await.unwrap();

    assert!(loaded.is_none());
}

#[tokio::test]
async fn test_commit_then_load_round_trips_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let alice = Username::new("alice");

    store.commit(&alice, &record("alice")).await.unwrap();

    assert_eq!(store.load(&alice).await.unwrap(), Some(record("alice")));
}

#[tokio::test]
async fn test_commit_survives_reopen() {
    // A second store opened on the same directory plays the part of a
    // restarted process.
    let dir = tempfile::tempdir().unwrap();
    let alice = Username::new("alice");
    {
        let store = FileStore::open(dir.path()).await.unwrap();
        store.commit(&alice, &record("alice")).await.unwrap();
    }

    let reopened = FileStore::open(dir.path()).await.unwrap();

    assert_eq!(reopened.load(&alice).await.unwrap(), Some(record("alice")));
}

#[tokio::test]
async fn test_commit_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();

    store
        .commit(&Username::new("alice"), &record("alice"))
        .await
        .unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(!names[0].ends_with(".tmp"), "unexpected temp file {names:?}");
}

#[tokio::test]
async fn test_keys_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();

    store
        .commit(&Username::new("alice"), &record("alice"))
        .await
        .unwrap();
    store.commit(&Username::new("bob"), &record("bob")).await.unwrap();

    assert_eq!(
        store.load(&Username::new("alice")).await.unwrap(),
        Some(record("alice"))
    );
    assert_eq!(
        store.load(&Username::new("bob")).await.unwrap(),
        Some(record("bob"))
    );
}

#[tokio::test]
async fn test_load_corrupt_file_returns_corrupt_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let alice = Username::new("alice");
    store.commit(&alice, &record("alice")).await.unwrap();

    // Overwrite the only record file with garbage.
    let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
    std::fs::write(entry.path(), b"{ truncated").unwrap();

    let result = store.load(&alice).await;

    assert!(
        matches!(result, Err(StoreError::Corrupt { ref key, .. }) if *key == alice),
        "expected Corrupt, got {result:?}"
    );
}

#[tokio::test]
async fn test_arc_wrapped_store_is_a_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).await.unwrap());
    let alice = Username::new("alice");

    store.commit(&alice, &record("alice")).await.unwrap();

    assert!(StateStore::load(&store, &alice).await.unwrap().is_some());
}

#[tokio::test]
async fn test_commit_long_username_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let long = "u".repeat(200);
    let key = Username::new(long.as_str());

    assert_eq!(store.load(&key).await.unwrap(), None);
    store.commit(&key, &record(&long)).await.unwrap();

    assert_eq!(store.load(&key).await.unwrap(), Some(record(&long)));
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().all(|n| n.len() < 100), "names too long: {names:?}");
}

#[tokio::test]
async fn test_load_digest_named_record_of_other_user_returns_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let key = Username::new("a".repeat(150));
    // Simulates a digest collision: another user's record under this name.
    store.commit(&key, &record("mallory")).await.unwrap();

    let result = store.load(&key).await;

    assert!(
        matches!(result, Err(StoreError::KeyMismatch { ref found, .. }) if found.as_str() == "mallory"),
        "expected KeyMismatch, got {result:?}"
    );
}
