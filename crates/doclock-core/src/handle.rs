//! Scoped lock handle.

use std::fmt;
use std::sync::Arc;

use tracing::{instrument, warn};

use crate::error::LockResult;
use crate::id::LockId;
use crate::traits::LockStore;

/// Handle to a held lock.
///
/// Only produced by a successful acquisition. At most one release is issued
/// for a handle: either by [`release`](LockHandle::release), which reports
/// store errors, or on drop, which spawns the release on the current tokio
/// runtime. A handle dropped outside a runtime leaves the record to expire on
/// its own.
///
/// # Example
///
/// ```rust,ignore
/// if let Some(handle) = coordinator.acquire_scoped("order-42", None).await? {
///     write_order().await?;
///     handle.release().await?;
/// }
/// ```
pub struct LockHandle<S: LockStore> {
    id: LockId,
    /// `None` once the release has been issued.
    store: Option<Arc<S>>,
}

impl<S: LockStore> LockHandle<S> {
    pub(crate) fn new(id: LockId, store: Arc<S>) -> Self {
        Self {
            id,
            store: Some(store),
        }
    }

    /// The identifier of the held lock.
    pub fn id(&self) -> &LockId {
        &self.id
    }

    /// Explicitly releases the lock.
    #[instrument(skip(self), fields(lock.id = %self.id))]
    pub async fn release(mut self) -> LockResult<()> {
        match self.store.take() {
            Some(store) => store.release(&self.id).await,
            None => Ok(()),
        }
    }
}

impl<S: LockStore> fmt::Debug for LockHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("id", &self.id)
            .field("released", &self.store.is_none())
            .finish()
    }
}

impl<S: LockStore> Drop for LockHandle<S> {
    fn drop(&mut self) {
        let Some(store) = self.store.take() else {
            return;
        };
        let id = self.id.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = store.release(&id).await {
                        warn!(lock.id = %id, error = %e, "release on drop failed");
                    }
                });
            }
            Err(_) => {
                warn!(
                    lock.id = %id,
                    "lock handle dropped outside a tokio runtime; record left to expire"
                );
            }
        }
    }
}
