// Integration tests against DynamoDB Local
// Run with DynamoDB Local listening and any AWS credentials exported:
// AWS_ACCESS_KEY_ID=local AWS_SECRET_ACCESS_KEY=local \
//     CONDLOCK_DYNAMO_ENDPOINT=localhost:8000 cargo test -p condlock-dynamo -- --ignored

use std::sync::Arc;
use std::time::Duration;

use condlock_core::{LockService, ManualClock, Store};
use condlock_dynamo::{DynamoStore, DynamoStoreConfig};

const TTL: Duration = Duration::from_secs(4);

async fn local_store(table: &str) -> (DynamoStore, Arc<ManualClock>) {
    let endpoint = std::env::var("CONDLOCK_DYNAMO_ENDPOINT")
        .unwrap_or_else(|_| "localhost:8000".to_string());
    let config = DynamoStoreConfig {
        table_name: format!("{}-{}", table, std::process::id()),
        region: Some("us-east-1".to_string()),
        endpoint: Some(endpoint),
        disable_ssl: true,
    };

    let clock = Arc::new(ManualClock::starting_at(1_424_385_592_000));
    let store = DynamoStore::connect(&config)
        .await
        .unwrap()
        .with_clock(clock.clone());
    store.create_table().await.unwrap();
    (store, clock)
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_acquire_conflict_and_takeover() {
    let (store, clock) = local_store("acquire").await;

    store.acquire("db-name", TTL).await.unwrap();
    assert!(store.acquire("db-name", TTL).await.unwrap_err().is_locked());

    clock.advance(TTL + Duration::from_millis(1));
    store.acquire("db-name", TTL).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_delete_is_unconditional() {
    let (store, _clock) = local_store("delete").await;

    store.delete("missing").await.unwrap();
    store.acquire("db-name", TTL).await.unwrap();
    store.delete("db-name").await.unwrap();
    store.acquire("db-name", TTL).await.unwrap();
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_mutex_round_trip() {
    let (store, clock) = local_store("mutex").await;
    let service = LockService::new(Arc::new(store)).with_clock(clock.clone());

    let mutex = service.mutex("jobs", TTL, Duration::from_millis(100), Duration::from_secs(1));
    mutex.lock().await.unwrap();
    mutex.unlock().await;
    mutex.lock().await.unwrap();
}

#[tokio::test]
async fn test_connect_rejects_empty_table() {
    let config = DynamoStoreConfig::default();
    assert!(DynamoStore::connect(&config).await.is_err());
}
