//! Error types for lock operations.

use thiserror::Error;

/// Errors that can occur during lock operations.
///
/// Contention is never reported through this type: a lock held by someone
/// else is a `false`, a `None` or an [`Acquisition::Contended`](crate::Acquisition).
#[derive(Error, Debug)]
pub enum LockError {
    /// Store connection or round-trip failed.
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid lock identifier.
    #[error("invalid lock name: {0}")]
    InvalidName(String),

    /// Rejected lock configuration.
    #[error("invalid lock options: {0}")]
    InvalidOptions(String),

    /// `execute()` was called before both callbacks were registered.
    #[error("no {0} callback registered before execute()")]
    MissingCallback(&'static str),

    /// Backend-specific error (e.g. a record that cannot be decoded).
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LockError {
    /// Wraps a driver error as a connection failure.
    pub fn connection<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection(Box::new(err))
    }
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
