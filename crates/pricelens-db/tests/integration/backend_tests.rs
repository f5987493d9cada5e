use pricelens_core::traits::KvBackend;
use pricelens_db::{SqliteBackend, StorageConfig};

use crate::common::memory_backend;

#[tokio::test]
async fn get_missing_key_returns_none() {
    let backend = memory_backend().await;
    assert_eq!(backend.get("absent").await.unwrap(), None);
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let backend = memory_backend().await;

    backend.put("inventory", r#"[{"id":"a"}]"#).await.unwrap();
    let stored = backend.get("inventory").await.unwrap();
    assert_eq!(stored.as_deref(), Some(r#"[{"id":"a"}]"#));
}

#[tokio::test]
async fn put_replaces_existing_value() {
    let backend = memory_backend().await;

    backend.put("points", "50").await.unwrap();
    backend.put("points", "80").await.unwrap();
    assert_eq!(backend.get("points").await.unwrap().as_deref(), Some("80"));
}

#[tokio::test]
async fn remove_deletes_the_key() {
    let backend = memory_backend().await;

    backend.put("list", "[]").await.unwrap();
    backend.remove("list").await.unwrap();
    assert_eq!(backend.get("list").await.unwrap(), None);

    // Removing an absent key is not an error.
    backend.remove("list").await.unwrap();
}

#[tokio::test]
async fn keys_are_independent() {
    let backend = memory_backend().await;

    backend.put("a", "1").await.unwrap();
    backend.put("b", "2").await.unwrap();
    backend.remove("a").await.unwrap();

    assert_eq!(backend.get("a").await.unwrap(), None);
    assert_eq!(backend.get("b").await.unwrap().as_deref(), Some("2"));
}

#[tokio::test]
async fn connect_creates_the_file_and_persists_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        path: dir.path().join("nested").join("test.db"),
        max_connections: 2,
    };

    {
        let backend = SqliteBackend::connect(&config).await.unwrap();
        backend.put("inventory", r#"[{"id":"kept"}]"#).await.unwrap();
    }

    let reopened = SqliteBackend::connect(&config).await.unwrap();
    assert_eq!(
        reopened.get("inventory").await.unwrap().as_deref(),
        Some(r#"[{"id":"kept"}]"#)
    );
}
