use std::{sync::Arc, time::Duration};

use polaroidcli::management::{FileStorage, MemoryStorage, Storage, StorageEvent};
use tempfile::TempDir;

fn storage_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("nested").join("storage.json")
}

#[tokio::test]
async fn test_file_storage_persists_values() {
    let dir = TempDir::new().unwrap();
    let path = storage_path(&dir);

    let storage = FileStorage::open(&path).await.unwrap();
    assert_eq!(storage.get("accessToken").await.unwrap(), None);

    storage.set("accessToken", "A").await.unwrap();
    storage.set("tokenExpiration", "123").await.unwrap();
    assert!(path.is_file());

    let reopened = FileStorage::open(&path).await.unwrap();
    assert_eq!(
        reopened.get("accessToken").await.unwrap().as_deref(),
        Some("A")
    );
    assert_eq!(
        reopened.get("tokenExpiration").await.unwrap().as_deref(),
        Some("123")
    );

    reopened.remove("accessToken").await.unwrap();
    assert_eq!(storage.get("accessToken").await.unwrap(), None);
}

#[tokio::test]
async fn test_file_storage_treats_empty_file_as_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "").unwrap();

    let storage = FileStorage::open(&path).await.unwrap();
    assert_eq!(storage.get("accessToken").await.unwrap(), None);
    storage.set("accessToken", "A").await.unwrap();
    assert_eq!(
        storage.get("accessToken").await.unwrap().as_deref(),
        Some("A")
    );
}

#[tokio::test]
async fn test_file_storage_rejects_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{not json").unwrap();

    assert!(FileStorage::open(&path).await.is_err());
}

#[tokio::test]
async fn test_file_storage_publishes_local_changes() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::open(storage_path(&dir)).await.unwrap();
    let mut events = storage.subscribe();

    storage.set("accessToken", "A").await.unwrap();
    // same value again, no event
    storage.set("accessToken", "A").await.unwrap();
    storage.remove("accessToken").await.unwrap();
    // removing a missing key, no event
    storage.remove("accessToken").await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        StorageEvent {
            key: "accessToken".to_string(),
            value: Some("A".to_string()),
            external: false,
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        StorageEvent {
            key: "accessToken".to_string(),
            value: None,
            external: false,
        }
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_poll_detects_changes_from_other_handle() {
    let dir = TempDir::new().unwrap();
    let path = storage_path(&dir);

    let ours = FileStorage::open(&path).await.unwrap();
    let theirs = FileStorage::open(&path).await.unwrap();
    let mut events = ours.subscribe();

    theirs.set("accessToken", "A").await.unwrap();
    theirs.set("refreshToken", "R").await.unwrap();

    assert_eq!(ours.poll_external_changes().await.unwrap(), 2);
    let first = events.recv().await.unwrap();
    assert!(first.external);
    assert_eq!(first.key, "accessToken");

    // nothing new since the last poll
    assert_eq!(ours.poll_external_changes().await.unwrap(), 0);

    theirs.remove("accessToken").await.unwrap();
    assert_eq!(ours.poll_external_changes().await.unwrap(), 1);
}

#[tokio::test]
async fn test_watcher_publishes_external_changes() {
    let dir = TempDir::new().unwrap();
    let path = storage_path(&dir);

    let ours = Arc::new(FileStorage::open(&path).await.unwrap());
    let theirs = FileStorage::open(&path).await.unwrap();
    let mut events = ours.subscribe();
    let watcher = ours.spawn_watcher(Duration::from_millis(20));

    theirs.set("pkce_code_verifier", "v").await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.key, "pkce_code_verifier");
    assert_eq!(event.value.as_deref(), Some("v"));
    assert!(event.external);

    watcher.abort();
}

#[tokio::test]
async fn test_memory_storage_events() {
    let storage = MemoryStorage::new();
    let mut events = storage.subscribe();

    storage.set("accessToken", "A").await.unwrap();
    storage.set("accessToken", "A").await.unwrap();
    storage.remove("accessToken").await.unwrap();
    storage.remove("accessToken").await.unwrap();

    assert_eq!(events.recv().await.unwrap().value.as_deref(), Some("A"));
    assert_eq!(events.recv().await.unwrap().value, None);
    assert!(events.try_recv().is_err());
    assert!(storage.is_empty().await);
}
