//! Lock configuration.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::error::{LockError, LockResult};

/// Collection holding one record per lock identifier.
pub const DEFAULT_COLLECTION_NAME: &str = "_locks";

/// Smallest lifetime a lock record is given. Store expiry sweeps cannot
/// reliably honor anything shorter.
pub const DEFAULT_MIN_TTL: Duration = Duration::from_secs(10);

/// Wait budget used when the caller does not supply one.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(30);

/// Configuration shared by a lock store and every coordinator built on it.
///
/// Built once (via [`Default`], [`LockOptions::builder`] or deserialization)
/// and never mutated afterwards; stores own their copy and hand out
/// references.
///
/// Deserializes from a flat map with second-granularity fields, all optional:
///
/// ```json
/// { "collection_name": "_locks", "min_ttl_seconds": 10, "default_wait_seconds": 30 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawLockOptions")]
pub struct LockOptions {
    collection_name: String,
    min_ttl: Duration,
    default_wait: Duration,
}

impl LockOptions {
    /// Returns a new builder starting from the defaults.
    pub fn builder() -> LockOptionsBuilder {
        LockOptionsBuilder::new()
    }

    /// Name of the collection holding lock records.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Floor applied to every wait budget.
    pub fn min_ttl(&self) -> Duration {
        self.min_ttl
    }

    /// Wait budget used for `None`.
    pub fn default_wait(&self) -> Duration {
        self.default_wait
    }

    /// Resolves a requested wait budget to the lifetime actually given to the
    /// lock record: `None` becomes the default, anything below the floor is
    /// raised to it.
    pub fn effective_ttl(&self, wait: Option<Duration>) -> Duration {
        wait.unwrap_or(self.default_wait).max(self.min_ttl)
    }

    /// Value written to `expiresAt` for a record claimed at `now`.
    ///
    /// The expiry sweep removes a record `min_ttl` after its `expiresAt`, so
    /// the stored value is shifted back by the floor and the record
    /// disappears exactly `ttl` after the claim.
    pub fn expires_at(&self, now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
        now.checked_add_signed(to_delta(ttl.saturating_sub(self.min_ttl)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Instant at which the expiry sweep may remove a record stored with
    /// `expires_at`.
    pub fn swept_at(&self, expires_at: DateTime<Utc>) -> DateTime<Utc> {
        expires_at
            .checked_add_signed(to_delta(self.min_ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whole seconds until a record stored with `expires_at` is swept,
    /// rounded down. Zero or negative once the sweep is overdue.
    pub fn wait_hint_seconds(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        (self.swept_at(expires_at) - now)
            .num_milliseconds()
            .div_euclid(1000)
    }

    fn validate(self) -> LockResult<Self> {
        if self.collection_name.trim().is_empty() {
            return Err(LockError::InvalidOptions(
                "collection name must not be empty".to_string(),
            ));
        }
        // The expiry index counts in whole seconds.
        if self.min_ttl.as_secs() == 0 || self.min_ttl.subsec_nanos() != 0 {
            return Err(LockError::InvalidOptions(
                "minimum TTL must be a whole number of seconds, at least one".to_string(),
            ));
        }
        Ok(self)
    }
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            min_ttl: DEFAULT_MIN_TTL,
            default_wait: DEFAULT_WAIT,
        }
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// Builder for [`LockOptions`].
#[derive(Debug, Clone)]
pub struct LockOptionsBuilder {
    options: LockOptions,
}

impl LockOptionsBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            options: LockOptions::default(),
        }
    }

    /// Sets the lock collection name.
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.options.collection_name = name.into();
        self
    }

    /// Sets the minimum record lifetime.
    ///
    /// This is also the `expireAfterSeconds` of the store's expiry index.
    pub fn min_ttl(mut self, min_ttl: Duration) -> Self {
        self.options.min_ttl = min_ttl;
        self
    }

    /// Sets the wait budget used when a caller passes `None`.
    pub fn default_wait(mut self, wait: Duration) -> Self {
        self.options.default_wait = wait;
        self
    }

    /// Builds the options.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::InvalidOptions`] for an empty collection name or a
    /// minimum TTL that is not a whole, non-zero number of seconds.
    pub fn build(self) -> LockResult<LockOptions> {
        self.options.validate()
    }
}

impl Default for LockOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawLockOptions {
    collection_name: String,
    min_ttl_seconds: u64,
    default_wait_seconds: u64,
}

impl Default for RawLockOptions {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            min_ttl_seconds: DEFAULT_MIN_TTL.as_secs(),
            default_wait_seconds: DEFAULT_WAIT.as_secs(),
        }
    }
}

impl TryFrom<RawLockOptions> for LockOptions {
    type Error = LockError;

    fn try_from(raw: RawLockOptions) -> LockResult<Self> {
        LockOptions {
            collection_name: raw.collection_name,
            min_ttl: Duration::from_secs(raw.min_ttl_seconds),
            default_wait: Duration::from_secs(raw.default_wait_seconds),
        }
        .validate()
    }
}
