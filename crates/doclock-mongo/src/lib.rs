//! MongoDB backend for doclock.
//!
//! Lock records live in one collection (`_locks` by default) as
//! `{ _id, locked, expiresAt }` documents, with a TTL index on `expiresAt`
//! cleaning up records whose holders never released them.

pub mod builder;
pub mod document;
pub mod store;

pub use builder::MongoLockStoreBuilder;
pub use document::LockDocument;
pub use store::{EXPIRY_INDEX_NAME, MongoLockStore};
