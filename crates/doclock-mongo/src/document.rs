use chrono::Utc;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// One lock record: `{ _id, locked, expiresAt }`.
///
/// `expiresAt` carries the TTL index, which removes the document
/// `min_ttl` after the stored instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockDocument {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub locked: bool,

    #[serde(
        rename = "expiresAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime>,
}

pub(crate) fn to_bson(value: chrono::DateTime<Utc>) -> DateTime {
    DateTime::from_millis(value.timestamp_millis())
}

pub(crate) fn from_bson(value: DateTime) -> Option<chrono::DateTime<Utc>> {
    chrono::DateTime::from_timestamp_millis(value.timestamp_millis())
}
