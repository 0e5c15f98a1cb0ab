//! Scripted lock store for testing coordinator and dispatch behavior.

use chrono::{TimeDelta, Utc};
use doclock_core::error::{LockError, LockResult};
use doclock_core::id::LockId;
use doclock_core::options::LockOptions;
use doclock_core::traits::{Claim, LockStore};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// What the next claim should report.
#[derive(Debug, Clone, Copy)]
pub enum ScriptedClaim {
    /// Record absent: acquired.
    Unlocked,
    /// Record held, with its stored `expiresAt` this far from now.
    Locked { expires_in: TimeDelta },
    /// Store unreachable.
    Fail,
}

/// Lock store that replays scripted claim outcomes and records every call.
///
/// Once the script is exhausted every claim reports the fallback outcome.
pub struct RecordingStore {
    options: LockOptions,
    script: Mutex<VecDeque<ScriptedClaim>>,
    fallback: ScriptedClaim,
    claims: Mutex<Vec<(String, Duration)>>,
    releases: Mutex<Vec<String>>,
    fail_release: bool,
}

impl RecordingStore {
    /// Creates a store that reports every lock as free.
    pub fn new() -> Self {
        Self::scripted([])
    }

    /// Creates a store replaying `script` in order.
    pub fn scripted(script: impl IntoIterator<Item = ScriptedClaim>) -> Self {
        Self {
            options: LockOptions::default(),
            script: Mutex::new(script.into_iter().collect()),
            fallback: ScriptedClaim::Unlocked,
            claims: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
            fail_release: false,
        }
    }

    /// Creates a store that reports every lock as held, expiring `expires_in`
    /// from the time of the claim.
    pub fn locked(expires_in: TimeDelta) -> Self {
        Self {
            fallback: ScriptedClaim::Locked { expires_in },
            ..Self::new()
        }
    }

    /// Creates a store whose every claim fails.
    pub fn unreachable() -> Self {
        Self {
            fallback: ScriptedClaim::Fail,
            ..Self::new()
        }
    }

    /// Makes every release fail.
    pub fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// Identifier and TTL of every claim, in order.
    pub fn claims(&self) -> Vec<(String, Duration)> {
        self.claims.lock().unwrap().clone()
    }

    /// Identifier of every release, in order.
    pub fn releases(&self) -> Vec<String> {
        self.releases.lock().unwrap().clone()
    }

    pub fn release_count(&self) -> usize {
        self.releases.lock().unwrap().len()
    }

    /// Waits up to one second for `count` releases, for releases issued from
    /// a spawned task.
    pub async fn wait_for_releases(&self, count: usize) -> usize {
        for _ in 0..100 {
            if self.release_count() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.release_count()
    }
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unreachable_store() -> LockError {
    LockError::connection(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "store unreachable",
    ))
}

impl LockStore for RecordingStore {
    fn options(&self) -> &LockOptions {
        &self.options
    }

    async fn claim(&self, id: &LockId, ttl: Duration) -> LockResult<Claim> {
        self.claims
            .lock()
            .unwrap()
            .push((id.as_str().to_string(), ttl));

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        match step {
            ScriptedClaim::Unlocked => Ok(Claim::created()),
            ScriptedClaim::Locked { expires_in } => {
                Ok(Claim::observed(true, Utc::now() + expires_in))
            }
            ScriptedClaim::Fail => Err(unreachable_store()),
        }
    }

    async fn release(&self, id: &LockId) -> LockResult<()> {
        self.releases.lock().unwrap().push(id.as_str().to_string());
        if self.fail_release {
            return Err(unreachable_store());
        }
        Ok(())
    }
}
