//! Example: Using MongoDB document locks
//!
//! Run with: `cargo run --example mongo_lock`
//!
//! Requires a MongoDB server. Set MONGODB_URI environment variable
//! or modify the URI below.

use doclock::prelude::*;
use doclock::MongoLockStore;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Get MongoDB URI from environment or use default
    let uri = std::env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    println!("Connecting to MongoDB...");
    let store = MongoLockStore::builder()
        .uri(&uri)
        .database_name("doclock_example")
        .build()
        .await?;
    let coordinator = LockCoordinator::new(store);
    println!("Created lock coordinator (expiry index ensured)");

    // Plain acquire / release
    let acquisition = coordinator
        .acquire_with_wait_hint("example-resource", Some(Duration::from_secs(20)))
        .await?;
    match acquisition {
        Acquisition::Acquired => {
            println!("Lock acquired, doing work...");
            tokio::time::sleep(Duration::from_secs(1)).await;
            coordinator.release("example-resource").await?;
            println!("Lock released");
        }
        Acquisition::Contended { wait_hint_seconds } => {
            println!("Lock busy, retry in {wait_hint_seconds}s");
        }
    }

    // Scoped handle: released explicitly here, or on drop
    if let Some(handle) = coordinator.acquire_scoped("example-report", None).await? {
        println!("Holding {}", handle.id());
        handle.release().await?;
    }

    // Fluent dispatch
    let message = coordinator
        .lock::<String, LockError>("order-42", None)
        .on_acquired_async(|| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("order written".to_string())
        })
        .on_contended_with_hint(|secs| Ok(format!("order busy, retry in {secs}s")))
        .execute()
        .await?;
    println!("{message}");

    Ok(())
}
