//! Acquisition protocol on top of a [`LockStore`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{Span, debug, field, instrument, warn};

use crate::error::LockResult;
use crate::fluent::FluentLock;
use crate::handle::LockHandle;
use crate::id::LockId;
use crate::options::LockOptions;
use crate::traits::LockStore;

/// Outcome of a single acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// The record was unlocked (or absent) and is now held by the caller.
    Acquired,
    /// Someone else holds the lock.
    Contended {
        /// Whole seconds until the holder's record is expected to expire.
        ///
        /// Advisory only. Zero or negative means the expiry is overdue and the
        /// caller may retry immediately.
        wait_hint_seconds: i64,
    },
}

impl Acquisition {
    /// Returns `true` if the lock was acquired.
    pub fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired)
    }

    /// The wait hint in seconds, `0` when acquired.
    pub fn wait_hint_seconds(&self) -> i64 {
        match self {
            Self::Acquired => 0,
            Self::Contended { wait_hint_seconds } => *wait_hint_seconds,
        }
    }

    /// The wait hint as a sleep duration, never negative.
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.wait_hint_seconds().max(0).unsigned_abs())
    }
}

impl From<Acquisition> for (bool, i64) {
    fn from(acquisition: Acquisition) -> Self {
        (acquisition.is_acquired(), acquisition.wait_hint_seconds())
    }
}

/// Result of a claim that produced a handle or a wait hint.
pub(crate) enum Scoped<S: LockStore> {
    Held(LockHandle<S>),
    Contended(i64),
}

/// Entry point for acquiring and releasing locks against a [`LockStore`].
///
/// Cheap to clone; clones share the store. No in-process locking takes part
/// in acquisition, so any number of coordinators (in one or many processes)
/// can work against the same collection.
///
/// Wait budgets are `Option<Duration>`: `None` uses
/// [`LockOptions::default_wait`], and anything below
/// [`LockOptions::min_ttl`] is raised to it.
///
/// # Example
///
/// ```rust,ignore
/// let coordinator = LockCoordinator::new(store);
///
/// match coordinator.acquire_with_wait_hint("order-42", None).await? {
///     Acquisition::Acquired => {
///         write_order().await?;
///         coordinator.release("order-42").await?;
///     }
///     Acquisition::Contended { wait_hint_seconds } => {
///         println!("busy, retry in {wait_hint_seconds}s");
///     }
/// }
/// ```
pub struct LockCoordinator<S> {
    store: Arc<S>,
}

impl<S> Clone for LockCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LockStore> LockCoordinator<S> {
    /// Creates a coordinator owning `store`.
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Creates a coordinator sharing an existing store.
    pub fn from_arc(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the store's options.
    pub fn options(&self) -> &LockOptions {
        self.store.options()
    }

    /// Lifetime given to a record claimed with `wait`.
    pub fn effective_ttl(&self, wait: Option<Duration>) -> Duration {
        self.options().effective_ttl(wait)
    }

    /// Attempts to acquire the lock once.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Lock acquired; the caller must release it
    /// * `Ok(false)` - Lock is held by someone else
    /// * `Err(...)` - Invalid identifier or store failure
    pub async fn acquire(
        &self,
        id: impl Into<LockId>,
        wait: Option<Duration>,
    ) -> LockResult<bool> {
        let acquisition = self.claim(&id.into(), wait).await?;
        Ok(acquisition.is_acquired())
    }

    /// Attempts to acquire the lock once, reporting how long to wait when it
    /// is contended.
    pub async fn acquire_with_wait_hint(
        &self,
        id: impl Into<LockId>,
        wait: Option<Duration>,
    ) -> LockResult<Acquisition> {
        self.claim(&id.into(), wait).await
    }

    /// Attempts to acquire the lock once, returning a handle that releases it.
    ///
    /// Returns `Ok(None)` if the lock is held by someone else.
    pub async fn acquire_scoped(
        &self,
        id: impl Into<LockId>,
        wait: Option<Duration>,
    ) -> LockResult<Option<LockHandle<S>>> {
        match self.claim_scoped(id.into(), wait).await? {
            Scoped::Held(handle) => Ok(Some(handle)),
            Scoped::Contended(_) => Ok(None),
        }
    }

    /// Releases the lock.
    ///
    /// Unconditional: the caller is trusted to only release locks it holds.
    pub async fn release(&self, id: impl Into<LockId>) -> LockResult<()> {
        self.release_id(&id.into()).await
    }

    /// Starts a fluent lock declaration for `id`.
    ///
    /// ```rust,ignore
    /// let message = coordinator
    ///     .lock("order-42", None)
    ///     .on_acquired_async(|| async { write_order().await })
    ///     .on_contended_with_hint(|secs| Ok(format!("retry in {secs}s")))
    ///     .execute()
    ///     .await?;
    /// ```
    pub fn lock<T, E>(
        &self,
        id: impl Into<LockId>,
        wait: Option<Duration>,
    ) -> FluentLock<'_, S, T, E> {
        FluentLock::new(self, id.into(), wait)
    }

    pub(crate) async fn claim_scoped(
        &self,
        id: LockId,
        wait: Option<Duration>,
    ) -> LockResult<Scoped<S>> {
        match self.claim(&id, wait).await? {
            Acquisition::Acquired => {
                Ok(Scoped::Held(LockHandle::new(id, Arc::clone(&self.store))))
            }
            Acquisition::Contended { wait_hint_seconds } => {
                Ok(Scoped::Contended(wait_hint_seconds))
            }
        }
    }

    #[instrument(skip(self, id), fields(lock.id = %id))]
    async fn release_id(&self, id: &LockId) -> LockResult<()> {
        self.store.release(id).await
    }

    #[instrument(
        skip(self, id),
        fields(lock.id = %id, ttl_secs = field::Empty, acquired = field::Empty)
    )]
    async fn claim(&self, id: &LockId, wait: Option<Duration>) -> LockResult<Acquisition> {
        id.validate()?;
        let options = self.store.options();
        let ttl = options.effective_ttl(wait);
        Span::current().record("ttl_secs", ttl.as_secs());

        let claim = self.store.claim(id, ttl).await?;
        let acquisition = if !claim.was_locked {
            Acquisition::Acquired
        } else {
            let wait_hint_seconds = match claim.prior_expires_at {
                Some(expires_at) => options.wait_hint_seconds(expires_at, Utc::now()),
                None => {
                    warn!("locked record has no expiry; reporting a zero wait hint");
                    0
                }
            };
            Acquisition::Contended { wait_hint_seconds }
        };

        Span::current().record("acquired", acquisition.is_acquired());
        debug!(?acquisition, "claim completed");
        Ok(acquisition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LockError;
    use crate::memory::MemoryLockStore;

    fn coordinator() -> LockCoordinator<MemoryLockStore> {
        LockCoordinator::new(MemoryLockStore::new())
    }

    #[tokio::test]
    async fn fresh_identifier_is_acquired_with_zero_hint() {
        let coordinator = coordinator();
        let acquisition = coordinator
            .acquire_with_wait_hint("fresh", None)
            .await
            .unwrap();
        assert_eq!(acquisition, Acquisition::Acquired);
        assert_eq!(<(bool, i64)>::from(acquisition), (true, 0));
    }

    #[tokio::test]
    async fn held_identifier_reports_remaining_lifetime() {
        let coordinator = coordinator();
        assert!(coordinator.acquire("held", Some(Duration::from_secs(30))).await.unwrap());

        let acquisition = coordinator
            .acquire_with_wait_hint("held", Some(Duration::from_secs(30)))
            .await
            .unwrap();
        assert!(!acquisition.is_acquired());
        let hint = acquisition.wait_hint_seconds();
        assert!((29..=30).contains(&hint), "unexpected hint {hint}");
        assert_eq!(acquisition.retry_after(), Duration::from_secs(hint as u64));
    }

    #[tokio::test]
    async fn short_wait_is_clamped_to_floor() {
        let coordinator = coordinator();
        assert_eq!(
            coordinator.effective_ttl(Some(Duration::from_secs(2))),
            Duration::from_secs(10)
        );

        coordinator.acquire("short", Some(Duration::from_secs(2))).await.unwrap();
        let hint = coordinator
            .acquire_with_wait_hint("short", None)
            .await
            .unwrap()
            .wait_hint_seconds();
        assert!((9..=10).contains(&hint), "unexpected hint {hint}");
    }

    #[tokio::test]
    async fn release_makes_lock_available_immediately() {
        let coordinator = coordinator();
        assert!(coordinator.acquire("cycle", None).await.unwrap());
        assert!(!coordinator.acquire("cycle", None).await.unwrap());

        coordinator.release("cycle").await.unwrap();
        let acquisition = coordinator.acquire_with_wait_hint("cycle", None).await.unwrap();
        assert_eq!(acquisition, Acquisition::Acquired);
    }

    #[tokio::test]
    async fn scoped_acquisition_returns_none_when_contended() {
        let coordinator = coordinator();
        let handle = coordinator.acquire_scoped("scoped", None).await.unwrap();
        assert_eq!(handle.as_ref().map(|h| h.id().as_str()), Some("scoped"));

        assert!(coordinator.acquire_scoped("scoped", None).await.unwrap().is_none());

        handle.unwrap().release().await.unwrap();
        assert!(!coordinator.store().is_locked("scoped"));
    }

    #[tokio::test]
    async fn empty_identifier_never_reaches_store() {
        let coordinator = coordinator();
        let err = coordinator.acquire("", None).await.unwrap_err();
        assert!(matches!(err, LockError::InvalidName(_)));
        assert!(coordinator.store().is_empty());
    }

    #[test]
    fn contended_hint_is_clamped_when_overdue() {
        let overdue = Acquisition::Contended {
            wait_hint_seconds: -3,
        };
        assert_eq!(overdue.retry_after(), Duration::ZERO);
        assert_eq!(overdue.wait_hint_seconds(), -3);
    }
}
