//! Integration tests for the MongoDB lock store.

use doclock::{
    Acquisition, EXPIRY_INDEX_NAME, LockCoordinator, LockDocument, LockError, LockOptions,
    MongoLockStore,
};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Database};
use std::time::Duration;

mod common;

/// Helper to get MongoDB URI from environment or use default.
fn get_mongo_uri() -> String {
    std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

async fn test_database() -> Database {
    let client = Client::with_uri_str(get_mongo_uri())
        .await
        .expect("Failed to connect to MongoDB");
    client.database("test_doclock")
}

/// Each test gets its own collection so runs don't see each other's records.
async fn test_store() -> MongoLockStore {
    let options = LockOptions::builder()
        .collection_name(format!("locks_{}", uuid::Uuid::new_v4().simple()))
        .build()
        .unwrap();
    MongoLockStore::builder()
        .database(test_database().await)
        .options(options)
        .build()
        .await
        .expect("Failed to build store")
}

#[tokio::test]
#[ignore] // Requires MongoDB server running
async fn test_mongo_claim_contend_release_reclaim() {
    common::init_tracing();
    let coordinator = LockCoordinator::new(test_store().await);
    let id = uuid::Uuid::new_v4();

    // 1. Acquire
    let first = coordinator.acquire_with_wait_hint(id, None).await.unwrap();
    assert_eq!(first, Acquisition::Acquired);

    // 2. Contend: holder's 30s lifetime shows up in the hint
    let second = coordinator.acquire_with_wait_hint(id, None).await.unwrap();
    let hint = second.wait_hint_seconds();
    assert!(!second.is_acquired());
    assert!((28..=30).contains(&hint), "unexpected hint {hint}");

    // 3. Release
    coordinator.release(id).await.unwrap();

    // 4. Reclaim
    let third = coordinator.acquire_with_wait_hint(id, None).await.unwrap();
    assert_eq!(third, Acquisition::Acquired);
    coordinator.release(id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires MongoDB server running
async fn test_mongo_record_shape() {
    let store = test_store().await;
    let coordinator = LockCoordinator::new(store.clone());

    coordinator
        .acquire("shape", Some(Duration::from_secs(40)))
        .await
        .unwrap();

    let raw = store
        .collection()
        .clone_with_type::<mongodb::bson::Document>()
        .find_one(doc! { "_id": "shape" })
        .await
        .unwrap()
        .expect("record should exist");
    assert!(raw.get_bool("locked").unwrap());
    let expires_at = raw.get_datetime("expiresAt").unwrap().timestamp_millis();
    let remaining = (expires_at - chrono::Utc::now().timestamp_millis()) / 1000;
    // Stored expiry is ttl - min_ttl away.
    assert!((28..=30).contains(&remaining), "unexpected remaining {remaining}");

    coordinator.release("shape").await.unwrap();
    let document: LockDocument = store
        .collection()
        .find_one(doc! { "_id": "shape" })
        .await
        .unwrap()
        .expect("release keeps the record");
    assert!(!document.locked);
}

#[tokio::test]
#[ignore] // Requires MongoDB server running
async fn test_mongo_concurrent_claims_single_winner() {
    let coordinator = LockCoordinator::new(test_store().await);

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.acquire("race", None).await })
        })
        .collect();

    let mut winners = 0;
    for attempt in attempts {
        if attempt.await.unwrap().unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
#[ignore] // Requires MongoDB server running
async fn test_mongo_fluent_lock() {
    let coordinator = LockCoordinator::new(test_store().await);

    let value = coordinator
        .lock::<&str, LockError>("fluent", None)
        .on_acquired_async(|| async { Ok("written") })
        .on_contended_with_hint(|_| Ok("busy"))
        .execute()
        .await
        .unwrap();
    assert_eq!(value, "written");

    // Released by execute
    assert!(coordinator.acquire("fluent", None).await.unwrap());
    let value = coordinator
        .lock::<&str, LockError>("fluent", None)
        .on_acquired(|| Ok("written"))
        .on_contended(|| Ok("busy"))
        .execute()
        .await
        .unwrap();
    assert_eq!(value, "busy");
}

#[tokio::test]
#[ignore] // Requires MongoDB server running
async fn test_mongo_expiry_index() {
    let store = test_store().await;
    // Second call must be a no-op.
    store.ensure_expiry_index().await.unwrap();

    let indexes: Vec<_> = store
        .collection()
        .list_indexes()
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let index = indexes
        .iter()
        .find(|index| {
            index
                .options
                .as_ref()
                .and_then(|options| options.name.as_deref())
                == Some(EXPIRY_INDEX_NAME)
        })
        .expect("expiry index should exist");
    let expire_after = index.options.as_ref().and_then(|options| options.expire_after);
    assert_eq!(expire_after, Some(Duration::from_secs(10)));
}

#[tokio::test]
#[ignore] // Requires MongoDB server running
async fn test_mongo_reclaim_refreshes_expiry_in_claim() {
    let store = test_store().await;
    let coordinator = LockCoordinator::new(store.clone());
    let raw = store.collection().clone_with_type::<mongodb::bson::Document>();

    // 1. Leave a released record whose expiry is already overdue
    raw.insert_one(doc! {
        "_id": "stale",
        "locked": false,
        "expiresAt": mongodb::bson::DateTime::from_millis(0),
    })
    .await
    .unwrap();

    // 2. A single claim flips the lock and refreshes the expiry
    assert!(
        coordinator
            .acquire("stale", Some(Duration::from_secs(40)))
            .await
            .unwrap()
    );
    let record = raw
        .find_one(doc! { "_id": "stale" })
        .await
        .unwrap()
        .expect("record should exist");
    assert!(record.get_bool("locked").unwrap());
    let expires_at = record.get_datetime("expiresAt").unwrap().timestamp_millis();
    let remaining = (expires_at - chrono::Utc::now().timestamp_millis()) / 1000;
    assert!((28..=30).contains(&remaining), "unexpected remaining {remaining}");

    // 3. A held record keeps its holder's expiry
    assert!(!coordinator.acquire("stale", None).await.unwrap());
    let record = raw
        .find_one(doc! { "_id": "stale" })
        .await
        .unwrap()
        .expect("record should exist");
    assert_eq!(
        record.get_datetime("expiresAt").unwrap().timestamp_millis(),
        expires_at
    );
}
