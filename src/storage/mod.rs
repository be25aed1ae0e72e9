//! Table store layer.
//!
//! - [`TableStore`]: the contract the migration controller talks to
//! - [`SqliteStore`]: default backend, one database file
//! - `PostgresStore`: server backend behind the `postgres` feature
//! - [`sql`]: statement builders shared by both backends

// Allow significant_drop_tightening - a store holds one connection for one
// migration.
#![allow(clippy::significant_drop_tightening)]

pub mod metrics;
pub mod postgresql;
pub mod sql;
pub mod sqlite;
pub mod traits;

#[cfg(feature = "postgres")]
pub use postgresql::PostgresStore;
pub use sql::{SqlDialect, SqlValue, Statement};
pub use sqlite::SqliteStore;
pub use traits::TableStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::Result;

/// Connects to the store described by `config`.
///
/// # Errors
///
/// Returns [`crate::Error::StoreConnection`] if the store cannot be reached and
/// [`crate::Error::FeatureNotEnabled`] for a backend that was not compiled in.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn TableStore>> {
    match config.backend {
        StoreBackend::Sqlite => {
            let path = config.sqlite_path();
            tracing::debug!(path = %path.display(), "Opening SQLite store");
            Ok(Box::new(SqliteStore::new(path)?))
        },
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => {
            tracing::debug!(
                host = %config.host,
                database = %config.database,
                user = %config.user,
                "Connecting to PostgreSQL store"
            );
            Ok(Box::new(PostgresStore::connect(config)?))
        },
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres => Err(crate::Error::FeatureNotEnabled("postgres".to_string())),
    }
}
