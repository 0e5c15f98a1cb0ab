//! Cooperative distributed locks on a shared document store.
//!
//! Independent processes coordinate through one collection of lock records.
//! The store's atomic "set and return the previous value" update is the only
//! source of mutual exclusion; there is no consensus protocol and no
//! heartbeat. Records that are never released expire on their own.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use doclock::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoLockStore::builder()
//!         .uri("mongodb://localhost:27017")
//!         .database_name("app")
//!         .build()
//!         .await?;
//!     let coordinator = LockCoordinator::new(store);
//!
//!     // Plain acquire / release
//!     if coordinator.acquire("order-42", Some(Duration::from_secs(30))).await? {
//!         println!("Doing critical work...");
//!         coordinator.release("order-42").await?;
//!     }
//!
//!     // Scoped: released when the handle is released or dropped
//!     if let Some(handle) = coordinator.acquire_scoped("order-42", None).await? {
//!         println!("holding {}", handle.id());
//!         handle.release().await?;
//!     }
//!
//!     // Fluent
//!     let message = coordinator
//!         .lock("order-42", None)
//!         .on_acquired_async(|| async { Ok::<_, LockError>("written".to_string()) })
//!         .on_contended_with_hint(|secs| Ok(format!("busy, retry in {secs}s")))
//!         .execute()
//!         .await?;
//!     println!("{message}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`MongoLockStore`]: MongoDB collection with a TTL index on `expiresAt`.
//! - [`MemoryLockStore`]: in-process store with the same semantics, for tests
//!   and single-process use.
//!
//! # Crate Organization
//!
//! This is a facade that re-exports types from:
//! - `doclock-core`: coordinator, fluent dispatch, handles, options, errors
//! - `doclock-mongo`: MongoDB store
//!
//! For fine-grained control, you can depend on individual crates instead.

// Re-export core types and traits
pub use doclock_core::*;

// Re-export the MongoDB backend
pub use doclock_mongo::*;
