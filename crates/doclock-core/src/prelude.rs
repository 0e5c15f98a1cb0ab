//! Convenience prelude for lock types.

pub use crate::coordinator::{Acquisition, LockCoordinator};
pub use crate::error::{LockError, LockResult};
pub use crate::fluent::FluentLock;
pub use crate::handle::LockHandle;
pub use crate::id::LockId;
pub use crate::memory::MemoryLockStore;
pub use crate::options::{LockOptions, LockOptionsBuilder};
pub use crate::traits::{Claim, LockStore};
