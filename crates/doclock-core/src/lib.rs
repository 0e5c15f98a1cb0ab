//! Core types for cooperative locks on a shared document store.
//!
//! A lock is a record in a shared collection. Acquiring it is one atomic
//! "set `locked = true` and tell me what it was" round-trip against the
//! store ([`LockStore::claim`]); releasing it flips the flag back. Records
//! that are never released are removed by the store's own expiry sweep, so a
//! crashed holder cannot wedge a lock forever.
//!
//! [`LockCoordinator`] turns claims into [`Acquisition`]s with a wait hint,
//! [`LockHandle`] releases on scope exit, and [`FluentLock`] runs one of two
//! callbacks depending on the outcome:
//!
//! ```rust
//! use doclock_core::{LockCoordinator, LockError, MemoryLockStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), LockError> {
//! let coordinator = LockCoordinator::new(MemoryLockStore::new());
//!
//! let total = coordinator
//!     .lock("order-42", None)
//!     .on_acquired(|| Ok::<i64, LockError>(42))
//!     .on_contended_with_hint(|secs| Ok(-secs))
//!     .execute()
//!     .await?;
//!
//! assert_eq!(total, 42);
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod error;
pub mod fluent;
pub mod handle;
pub mod id;
pub mod memory;
pub mod options;
pub mod prelude;
pub mod traits;

pub use error::{LockError, LockResult};
pub use prelude::*;
