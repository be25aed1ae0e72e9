//! PostgreSQL table store.
//!
//! Available with the `postgres` feature. The store owns a single-threaded
//! Tokio runtime and one client connection; every trait call blocks on it.

#[cfg(feature = "postgres")]
mod implementation {
    use crate::config::StoreConfig;
    use crate::models::{TableRow, TableSchema};
    use crate::storage::metrics::timed;
    use crate::storage::sql::{SqlDialect, SqlValue, Statement, build_select_rows};
    use crate::storage::traits::TableStore;
    use crate::{Error, Result};
    use secrecy::ExposeSecret;
    use std::time::Duration;
    use tokio::runtime::Runtime;
    use tokio_postgres::types::ToSql;
    use tokio_postgres::{Client, NoTls};
    use tracing::instrument;

    const BACKEND: &str = "postgres";

    /// Default PostgreSQL port.
    const DEFAULT_PORT: u16 = 5432;

    /// Helper to convert query errors.
    #[allow(clippy::needless_pass_by_value)]
    fn query_error(operation: &str, e: tokio_postgres::Error) -> Error {
        Error::StoreQuery {
            operation: operation.to_string(),
            cause: e.to_string(),
        }
    }

    fn connection_error(cause: impl std::fmt::Display) -> Error {
        Error::StoreConnection {
            backend: BACKEND.to_string(),
            cause: cause.to_string(),
        }
    }

    fn bind(params: &[SqlValue]) -> Vec<&(dyn ToSql + Sync)> {
        params
            .iter()
            .map(|p| match p {
                SqlValue::Integer(v) => v as &(dyn ToSql + Sync),
                SqlValue::Text(v) => v as &(dyn ToSql + Sync),
            })
            .collect()
    }

    /// PostgreSQL table store.
    pub struct PostgresStore {
        runtime: Runtime,
        client: Client,
    }

    impl PostgresStore {
        /// Connects using store connection parameters.
        ///
        /// `socket` replaces `host` when set.
        ///
        /// # Errors
        ///
        /// Returns [`Error::StoreConnection`] if the server is unreachable or
        /// rejects the credentials.
        pub fn connect(config: &StoreConfig) -> Result<Self> {
            let mut pg = tokio_postgres::Config::new();
            match &config.socket {
                #[cfg(unix)]
                Some(socket) => {
                    pg.host_path(socket);
                },
                _ => {
                    pg.host(&config.host);
                },
            }
            pg.user(&config.user)
                .dbname(&config.database)
                .port(config.port.unwrap_or(DEFAULT_PORT))
                .connect_timeout(Duration::from_secs(10));
            if let Some(password) = &config.password {
                pg.password(password.expose_secret());
            }
            Self::connect_with(&pg)
        }

        /// Connects using a prepared driver configuration.
        ///
        /// # Errors
        ///
        /// Returns [`Error::StoreConnection`] if the runtime cannot start or
        /// the connection fails.
        pub fn connect_with(pg: &tokio_postgres::Config) -> Result<Self> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(connection_error)?;
            let (client, connection) = runtime
                .block_on(pg.connect(NoTls))
                .map_err(connection_error)?;
            runtime.spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "PostgreSQL connection closed");
                }
            });
            Ok(Self { runtime, client })
        }

        /// Integer primary key columns of `table`, in key order.
        fn integer_key_columns(&self, table: &str) -> Result<Vec<String>> {
            timed(BACKEND, "key_columns", || {
                self.runtime.block_on(async {
                    let rows = self
                        .client
                        .query(
                            "SELECT kcu.column_name::text \
                             FROM information_schema.table_constraints tc \
                             JOIN information_schema.key_column_usage kcu \
                               ON kcu.constraint_schema = tc.constraint_schema \
                              AND kcu.constraint_name = tc.constraint_name \
                             JOIN information_schema.columns c \
                               ON c.table_schema = kcu.table_schema \
                              AND c.table_name = kcu.table_name \
                              AND c.column_name = kcu.column_name \
                             WHERE tc.table_schema = current_schema() AND tc.table_name = $1 \
                               AND tc.constraint_type = 'PRIMARY KEY' \
                               AND c.data_type IN ('smallint', 'integer', 'bigint') \
                             ORDER BY kcu.ordinal_position",
                            &[&table],
                        )
                        .await
                        .map_err(|e| query_error("key_columns", e))?;
                    Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
                })
            })
        }
    }

    impl TableStore for PostgresStore {
        fn backend_name(&self) -> &'static str {
            BACKEND
        }

        fn dialect(&self) -> SqlDialect {
            SqlDialect::Postgres
        }

        #[instrument(skip(self), fields(backend = BACKEND))]
        fn table_exists(&self, table: &str) -> Result<bool> {
            timed(BACKEND, "table_exists", || {
                self.runtime.block_on(async {
                    let row = self
                        .client
                        .query_one(
                            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                             WHERE table_schema = current_schema() AND table_name = $1)",
                            &[&table],
                        )
                        .await
                        .map_err(|e| query_error("table_exists", e))?;
                    Ok(row.get::<_, bool>(0))
                })
            })
        }

        fn execute(&self, statement: &Statement) -> Result<()> {
            timed(BACKEND, "execute", || {
                self.runtime.block_on(async {
                    self.client
                        .execute(statement.sql.as_str(), &bind(&statement.params))
                        .await
                        .map(|_| ())
                        .map_err(|e| query_error("execute", e))
                })
            })
        }

        #[instrument(skip_all, fields(backend = BACKEND, statements = statements.len()))]
        fn execute_in_transaction(&mut self, statements: &[Statement]) -> Result<()> {
            let client = &mut self.client;
            let runtime = &self.runtime;
            timed(BACKEND, "transaction", || {
                runtime.block_on(async {
                    let tx = client
                        .transaction()
                        .await
                        .map_err(|e| query_error("begin", e))?;
                    for statement in statements {
                        tx.execute(statement.sql.as_str(), &bind(&statement.params))
                            .await
                            .map_err(|e| query_error("execute", e))?;
                    }
                    tx.commit().await.map_err(|e| query_error("commit", e))
                })
            })
        }

        fn table_columns(&self, table: &str) -> Result<TableSchema> {
            timed(BACKEND, "table_columns", || {
                self.runtime.block_on(async {
                    let rows = self
                        .client
                        .query(
                            "SELECT column_name::text FROM information_schema.columns \
                             WHERE table_schema = current_schema() AND table_name = $1 \
                             ORDER BY ordinal_position",
                            &[&table],
                        )
                        .await
                        .map_err(|e| query_error("table_columns", e))?;
                    Ok(TableSchema::new(rows.iter().map(|r| r.get::<_, String>(0))))
                })
            })
        }

        #[instrument(skip(self, columns), fields(backend = BACKEND, columns = columns.len()))]
        fn table_rows(&self, table: &str, columns: &TableSchema) -> Result<Vec<TableRow>> {
            if columns.is_empty() {
                return Ok(Vec::new());
            }
            let order_by = self.integer_key_columns(table)?;
            let sql = build_select_rows(SqlDialect::Postgres, table, columns, &order_by).sql;
            let width = columns.len();

            timed(BACKEND, "table_rows", || {
                self.runtime.block_on(async {
                    let rows = self
                        .client
                        .query(sql.as_str(), &[])
                        .await
                        .map_err(|e| query_error("table_rows", e))?;
                    Ok(rows
                        .iter()
                        .map(|row| {
                            TableRow::new((0..width).map(|i| row.get::<_, Option<String>>(i)).collect())
                        })
                        .collect())
                })
            })
        }
    }
}

#[cfg(feature = "postgres")]
pub use implementation::PostgresStore;

#[cfg(all(test, feature = "postgres"))]
mod tests {
    use super::*;
    use crate::services::schema::infer_definition;
    use crate::storage::TableStore;
    use crate::storage::sql::{SqlDialect, Statement, build_create_table, build_insert_batches};
    use crate::models::{TableRow, TableSchema};

    /// Gets test database URL from environment or skips test.
    fn get_test_db_url() -> Option<String> {
        std::env::var("TABLIFT_TEST_POSTGRES_URL").ok()
    }

    #[test]
    #[ignore = "requires TABLIFT_TEST_POSTGRES_URL"]
    fn test_postgres_import_and_read_back() {
        let Some(url) = get_test_db_url() else {
            return;
        };
        let pg: tokio_postgres::Config = url.parse().unwrap();
        let mut store = PostgresStore::connect_with(&pg).unwrap();
        let table = "tablift_pg_roundtrip";
        store
            .execute(&Statement::new(format!("DROP TABLE IF EXISTS \"{table}\"")))
            .unwrap();

        let def = infer_definition(table, &TableSchema::new(["id", "Name"])).unwrap();
        let rows = vec![
            TableRow::new(vec![Some("2".to_string()), None]),
            TableRow::from_texts(["1", "Alice"]),
        ];
        let mut statements = vec![build_create_table(SqlDialect::Postgres, &def)];
        statements.extend(build_insert_batches(SqlDialect::Postgres, &def, &rows, 10).unwrap());
        store.execute_in_transaction(&statements).unwrap();

        assert!(store.table_exists(table).unwrap());
        let data = store.read_table(table).unwrap();
        assert_eq!(data.schema.columns(), ["id", "Name"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[0], TableRow::from_texts(["1", "Alice"]));
        assert_eq!(data.rows[1].get(1), None);

        store
            .execute(&Statement::new(format!("DROP TABLE \"{table}\"")))
            .unwrap();
    }
}
