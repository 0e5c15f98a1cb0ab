//! Lock identifiers.

use std::fmt;

use uuid::Uuid;

use crate::error::{LockError, LockResult};

/// Normalized name of a lockable resource.
///
/// Raw strings are taken as-is; UUIDs are stored in their lowercase
/// hyphenated form, so `LockId::from(uuid)` and `LockId::from(uuid.to_string())`
/// name the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockId(String);

impl LockId {
    /// Returns the identifier as stored in the lock collection.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the stored string.
    pub fn into_inner(self) -> String {
        self.0
    }

    pub(crate) fn validate(&self) -> LockResult<()> {
        if self.0.is_empty() {
            return Err(LockError::InvalidName(
                "lock identifier must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LockId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for LockId {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

impl From<Uuid> for LockId {
    fn from(value: Uuid) -> Self {
        Self(value.hyphenated().to_string())
    }
}

impl From<&Uuid> for LockId {
    fn from(value: &Uuid) -> Self {
        Self::from(*value)
    }
}

impl From<&LockId> for LockId {
    fn from(value: &LockId) -> Self {
        value.clone()
    }
}
