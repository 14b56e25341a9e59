//! Tests against a live Redis.
//!
//! Run with `REDIS_URL=redis://localhost:6379 cargo test -- --ignored`.

use serial_test::serial;
use snapurl::domain::repositories::{KvStore, SetMode, SetOutcome};
use snapurl::infrastructure::store::RedisStore;
use std::time::Duration;

async fn connect() -> RedisStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    RedisStore::connect(&url, Duration::from_secs(2), 3)
        .await
        .unwrap()
}

async fn cleanup(store: &RedisStore, keys: &[&str]) {
    let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    store.delete(&keys).await.unwrap();
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_create_record_is_exclusive() {
    let store = connect().await;
    cleanup(&store, &["test:url:x", "test:clicks:x"]).await;

    let first = store
        .create_record(
            "test:url:x",
            b"first",
            "test:clicks:x",
            Some(Duration::from_secs(60)),
        )
        .await
        .unwrap();
    let second = store
        .create_record(
            "test:url:x",
            b"second",
            "test:clicks:x",
            Some(Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(first, SetOutcome::Stored);
    assert_eq!(second, SetOutcome::AlreadyExists);
    assert_eq!(
        store.get("test:url:x").await.unwrap(),
        Some(b"first".to_vec())
    );
    assert_eq!(
        store.get("test:clicks:x").await.unwrap(),
        Some(b"0".to_vec())
    );

    cleanup(&store, &["test:url:x", "test:clicks:x"]).await;
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_increment_sets_ttl_once() {
    let store = connect().await;
    cleanup(&store, &["test:counter"]).await;

    let first = store
        .increment("test:counter", Some(Duration::from_secs(60)))
        .await
        .unwrap();
    let second = store
        .increment("test:counter", Some(Duration::from_secs(3600)))
        .await
        .unwrap();

    assert_eq!(first.value, 1);
    assert_eq!(second.value, 2);
    assert!(second.ttl.unwrap() <= Duration::from_secs(60));

    cleanup(&store, &["test:counter"]).await;
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_counter_without_ttl_reports_none() {
    let store = connect().await;
    cleanup(&store, &["test:forever"]).await;

    let counter = store.increment("test:forever", None).await.unwrap();

    assert_eq!(counter.value, 1);
    assert!(counter.ttl.is_none());

    cleanup(&store, &["test:forever"]).await;
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_set_if_absent_and_delete() {
    let store = connect().await;
    cleanup(&store, &["test:kv"]).await;

    assert_eq!(
        store
            .set_with_ttl("test:kv", b"a", None, SetMode::IfAbsent)
            .await
            .unwrap(),
        SetOutcome::Stored
    );
    assert_eq!(
        store
            .set_with_ttl("test:kv", b"b", None, SetMode::IfAbsent)
            .await
            .unwrap(),
        SetOutcome::AlreadyExists
    );
    assert!(store.exists("test:kv").await.unwrap());

    assert_eq!(store.delete(&["test:kv".to_string()]).await.unwrap(), 1);
    assert!(!store.exists("test:kv").await.unwrap());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_delete_if_value_only_matches_exact_bytes() {
    let store = connect().await;
    let keys = vec!["test:url:y".to_string(), "test:clicks:y".to_string()];
    store.delete(&keys).await.unwrap();

    store
        .create_record("test:url:y", b"stale", "test:clicks:y", None)
        .await
        .unwrap();

    assert!(!store.delete_if_value("test:url:y", b"other", &keys).await.unwrap());
    assert!(store.exists("test:clicks:y").await.unwrap());

    assert!(store.delete_if_value("test:url:y", b"stale", &keys).await.unwrap());
    assert!(!store.exists("test:url:y").await.unwrap());
    assert!(!store.exists("test:clicks:y").await.unwrap());
}
