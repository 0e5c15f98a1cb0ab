//! In-process lock store.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::instrument;

use crate::error::LockResult;
use crate::id::LockId;
use crate::options::LockOptions;
use crate::traits::{Claim, LockStore};

#[derive(Debug, Clone, Copy)]
struct MemoryRecord {
    locked: bool,
    expires_at: DateTime<Utc>,
}

/// [`LockStore`] kept in process memory.
///
/// Behaves like the MongoDB store: claims are atomic (the internal mutex plays
/// the part of the server's document-level atomicity), release only flips
/// `locked`, and records are removed `min_ttl` after their `expiresAt` by
/// [`sweep`](MemoryLockStore::sweep), which every claim runs first.
///
/// Only coordinates tasks sharing the same instance.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    options: LockOptions,
    records: Mutex<HashMap<String, MemoryRecord>>,
}

impl MemoryLockStore {
    /// Creates an empty store with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given options.
    pub fn with_options(options: LockOptions) -> Self {
        Self {
            options,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Removes every record whose expiry has been reached at `now`,
    /// regardless of its `locked` flag. Returns the number removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.sweep_records(&mut self.records.lock(), now)
    }

    fn sweep_records(
        &self,
        records: &mut HashMap<String, MemoryRecord>,
        now: DateTime<Utc>,
    ) -> usize {
        let before = records.len();
        records.retain(|_, record| self.options.swept_at(record.expires_at) > now);
        before - records.len()
    }

    /// Returns `true` if a record for `id` exists and is locked.
    pub fn is_locked(&self, id: &str) -> bool {
        self.records.lock().get(id).is_some_and(|record| record.locked)
    }

    /// Stored `expiresAt` of the record for `id`.
    pub fn expires_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.records.lock().get(id).map(|record| record.expires_at)
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Claims `id` as of `now`. [`LockStore::claim`] calls this with the
    /// current time.
    pub fn claim_at(&self, id: &LockId, ttl: Duration, now: DateTime<Utc>) -> Claim {
        let mut records = self.records.lock();
        self.sweep_records(&mut records, now);
        let expires_at = self.options.expires_at(now, ttl);

        match records.entry(id.as_str().to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(MemoryRecord {
                    locked: true,
                    expires_at,
                });
                Claim::created()
            }
            Entry::Occupied(mut entry) => {
                let prior = *entry.get();
                let record = entry.get_mut();
                record.locked = true;
                if !prior.locked {
                    record.expires_at = expires_at;
                }
                Claim::observed(prior.locked, prior.expires_at)
            }
        }
    }
}

impl LockStore for MemoryLockStore {
    fn options(&self) -> &LockOptions {
        &self.options
    }

    #[instrument(skip(self, id), fields(lock.id = %id, backend = "memory"))]
    async fn claim(&self, id: &LockId, ttl: Duration) -> LockResult<Claim> {
        Ok(self.claim_at(id, ttl, Utc::now()))
    }

    #[instrument(skip(self, id), fields(lock.id = %id, backend = "memory"))]
    async fn release(&self, id: &LockId) -> LockResult<()> {
        if let Some(record) = self.records.lock().get_mut(id.as_str()) {
            record.locked = false;
        }
        Ok(())
    }
}
