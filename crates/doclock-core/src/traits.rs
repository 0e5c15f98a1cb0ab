//! Storage seam for lock records.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::LockResult;
use crate::id::LockId;
use crate::options::LockOptions;

// ============================================================================
// Claim Result
// ============================================================================

/// State of a lock record as observed immediately *before* a claim set it to
/// locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    /// `true` if the record existed and was already locked.
    pub was_locked: bool,
    /// The record's `expiresAt` before the claim, if the record existed.
    pub prior_expires_at: Option<DateTime<Utc>>,
}

impl Claim {
    /// A claim against a record that did not exist yet.
    pub const fn created() -> Self {
        Self {
            was_locked: false,
            prior_expires_at: None,
        }
    }

    /// A claim against an existing record.
    pub const fn observed(was_locked: bool, prior_expires_at: DateTime<Utc>) -> Self {
        Self {
            was_locked,
            prior_expires_at: Some(prior_expires_at),
        }
    }
}

// ============================================================================
// Lock Store Trait
// ============================================================================

/// Durable, shared collection of lock records.
///
/// Implementations must make [`claim`](LockStore::claim) a single atomic
/// read-and-set against the backing store: of any number of concurrent claims
/// on an unlocked identifier, exactly one may observe `was_locked == false`.
/// Nothing on the client side participates in that guarantee, since holders
/// are usually separate processes.
///
/// Records are expected to be removed by the store itself some time after
/// their expiry (e.g. a MongoDB TTL index with `expireAfterSeconds` set to
/// [`LockOptions::min_ttl`]). Neither method deletes records.
///
/// Store failures are returned as [`LockError::Connection`](crate::LockError)
/// and are never retried.
///
/// # Example
///
/// ```rust,ignore
/// let claim = store.claim(&"order-42".into(), Duration::from_secs(30)).await?;
/// if !claim.was_locked {
///     // we own the lock until we release it or the record expires
/// }
/// ```
pub trait LockStore: Send + Sync + 'static {
    /// Options the store was constructed with.
    fn options(&self) -> &LockOptions;

    /// Atomically sets `locked = true` on the record for `id`, creating it if
    /// absent, and returns the state observed before the update.
    ///
    /// `ttl` has already been clamped to the options' floor. When the record
    /// was absent or unlocked its `expiresAt` is refreshed from `ttl` via
    /// [`LockOptions::expires_at`]; a locked record keeps the holder's expiry.
    fn claim(&self, id: &LockId, ttl: Duration) -> impl Future<Output = LockResult<Claim>> + Send;

    /// Sets `locked = false` on the record for `id`.
    ///
    /// Unconditional and idempotent: no ownership check is made, and releasing
    /// an identifier with no record is a no-op.
    fn release(&self, id: &LockId) -> impl Future<Output = LockResult<()>> + Send;
}

impl<S: LockStore> LockStore for Arc<S> {
    fn options(&self) -> &LockOptions {
        (**self).options()
    }

    fn claim(&self, id: &LockId, ttl: Duration) -> impl Future<Output = LockResult<Claim>> + Send {
        (**self).claim(id, ttl)
    }

    fn release(&self, id: &LockId) -> impl Future<Output = LockResult<()>> + Send {
        (**self).release(id)
    }
}
