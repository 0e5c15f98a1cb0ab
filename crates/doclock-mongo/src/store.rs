use std::time::Duration;

use chrono::Utc;
use doclock_core::{
    error::{LockError, LockResult},
    id::LockId,
    options::LockOptions,
    traits::{Claim, LockStore},
};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{DateTime, Document, doc},
    error::{Error as MongoError, ErrorKind},
    options::{IndexOptions, ReturnDocument},
};
use tracing::{Span, debug, field, instrument};

use crate::{
    builder::MongoLockStoreBuilder,
    document::{LockDocument, from_bson, to_bson},
};

/// Name of the TTL index created by [`MongoLockStore::ensure_expiry_index`].
pub const EXPIRY_INDEX_NAME: &str = "expiresAt_ttl";

/// [`LockStore`] backed by a MongoDB collection.
///
/// A claim is a single `findOneAndUpdate` with `upsert: true` that sets
/// `locked: true` and returns the document as it was *before* the update.
/// MongoDB applies it atomically per document, so of any number of concurrent
/// claimants exactly one observes `locked: false` (or no document at all).
///
/// Stale records are removed by a TTL index on `expiresAt` with
/// `expireAfterSeconds` equal to [`LockOptions::min_ttl`]; see
/// [`ensure_expiry_index`](Self::ensure_expiry_index).
#[derive(Clone)]
pub struct MongoLockStore {
    collection: Collection<LockDocument>,
    options: LockOptions,
}

impl MongoLockStore {
    /// Creates a store on `database` using the collection named in `options`.
    ///
    /// Does not contact the server.
    pub fn new(database: &Database, options: LockOptions) -> Self {
        let collection = database.collection(options.collection_name());
        Self {
            collection,
            options,
        }
    }

    /// Returns a new builder for configuring the store.
    pub fn builder() -> MongoLockStoreBuilder {
        MongoLockStoreBuilder::new()
    }

    /// The lock collection.
    pub fn collection(&self) -> &Collection<LockDocument> {
        &self.collection
    }

    /// Creates the TTL index on `expiresAt` that removes stale lock records.
    ///
    /// Idempotent as long as an index with the same name and options does not
    /// already exist with a different `expireAfterSeconds`.
    #[instrument(
        skip(self),
        fields(collection = %self.options.collection_name(), backend = "mongo")
    )]
    pub async fn ensure_expiry_index(&self) -> LockResult<()> {
        let index_options = IndexOptions::builder()
            .name(EXPIRY_INDEX_NAME.to_string())
            .expire_after(self.options.min_ttl())
            .build();
        let index = IndexModel::builder()
            .keys(doc! { "expiresAt": 1 })
            .options(index_options)
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(store_error)?;

        debug!("expiry index ensured");
        Ok(())
    }
}

/// Update pipeline for a claim: `locked` is set unconditionally, `expiresAt`
/// is refreshed only when the record was absent or unlocked. Both fields are
/// computed from the document as it was before the stage, in one atomic write.
fn claim_pipeline(expires_at: DateTime) -> Vec<Document> {
    let held = doc! { "$eq": [{ "$ifNull": ["$locked", false] }, true] };
    vec![doc! {
        "$set": {
            "expiresAt": { "$cond": [held, "$expiresAt", expires_at] },
            "locked": true
        }
    }]
}

/// Record (de)serialization failures are backend errors; everything else the
/// driver reports is a connection failure.
fn store_error(err: MongoError) -> LockError {
    match *err.kind {
        ErrorKind::BsonDeserialization(_) | ErrorKind::BsonSerialization(_) => {
            LockError::Backend(Box::new(err))
        }
        _ => LockError::connection(err),
    }
}

impl LockStore for MongoLockStore {
    fn options(&self) -> &LockOptions {
        &self.options
    }

    #[instrument(
        skip(self, id),
        fields(lock.id = %id, backend = "mongo", was_locked = field::Empty)
    )]
    async fn claim(&self, id: &LockId, ttl: Duration) -> LockResult<Claim> {
        let expires_at = to_bson(self.options.expires_at(Utc::now(), ttl));

        let before = self
            .collection
            .find_one_and_update(doc! { "_id": id.as_str() }, claim_pipeline(expires_at))
            .upsert(true)
            .return_document(ReturnDocument::Before)
            .await
            .map_err(store_error)?;

        let claim = match before {
            None => Claim::created(),
            Some(document) => Claim {
                was_locked: document.locked,
                prior_expires_at: document.expires_at.and_then(from_bson),
            },
        };
        Span::current().record("was_locked", claim.was_locked);

        Ok(claim)
    }

    #[instrument(skip(self, id), fields(lock.id = %id, backend = "mongo"))]
    async fn release(&self, id: &LockId) -> LockResult<()> {
        self.collection
            .update_one(doc! { "_id": id.as_str() }, doc! { "$set": { "locked": false } })
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
