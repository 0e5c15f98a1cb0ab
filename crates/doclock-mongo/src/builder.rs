//! Builder for [`MongoLockStore`].

use doclock_core::error::{LockError, LockResult};
use doclock_core::options::LockOptions;
use mongodb::{Client, Database};
use tracing::instrument;

use crate::store::MongoLockStore;

/// Builder for MongoDB lock store configuration.
///
/// Either hand in an existing [`Database`] or a connection URI plus database
/// name. The expiry index is created on build unless disabled.
///
/// # Example
///
/// ```rust,no_run
/// use doclock_mongo::MongoLockStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MongoLockStore::builder()
///     .uri("mongodb://localhost:27017")
///     .database_name("app")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct MongoLockStoreBuilder {
    uri: Option<String>,
    database_name: Option<String>,
    database: Option<Database>,
    options: LockOptions,
    ensure_index: bool,
}

impl MongoLockStoreBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            uri: None,
            database_name: None,
            database: None,
            options: LockOptions::default(),
            ensure_index: true,
        }
    }

    /// Sets the connection string used when no database is supplied.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets the database to open from the URI.
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    /// Uses an existing database handle. Takes precedence over the URI.
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Sets the lock options.
    pub fn options(mut self, options: LockOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether to create the `expiresAt` TTL index on build (default `true`).
    pub fn ensure_index(mut self, ensure: bool) -> Self {
        self.ensure_index = ensure;
        self
    }

    /// Builds the store.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::InvalidOptions`] if neither a database nor a URI and
    /// database name were given, and [`LockError::Connection`] if connecting or
    /// creating the index fails.
    #[instrument(skip(self), fields(backend = "mongo", ensure_index = self.ensure_index))]
    pub async fn build(self) -> LockResult<MongoLockStore> {
        let database = match (self.database, self.uri, self.database_name) {
            (Some(database), _, _) => database,
            (None, Some(uri), Some(name)) => {
                let client = Client::with_uri_str(&uri)
                    .await
                    .map_err(LockError::connection)?;
                client.database(&name)
            }
            (None, _, _) => {
                return Err(LockError::InvalidOptions(
                    "either a database or a URI and database name must be provided".to_string(),
                ));
            }
        };

        let store = MongoLockStore::new(&database, self.options);
        if self.ensure_index {
            store.ensure_expiry_index().await?;
        }
        Ok(store)
    }
}

impl Default for MongoLockStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
