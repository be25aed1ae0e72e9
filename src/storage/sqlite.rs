//! `SQLite` table store.
//!
//! The default backend. The database is a single file given by the
//! `database` setting, created on first use.

use super::metrics::timed;
use super::sql::{SqlDialect, SqlValue, Statement, build_select_rows};
use super::traits::TableStore;
use crate::models::{TableRow, TableSchema};
use crate::{Error, Result};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql, params, params_from_iter};
use std::path::Path;
use tracing::instrument;

const BACKEND: &str = "sqlite";

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Integer(Some(v)) => ToSqlOutput::Owned(Value::Integer(*v)),
            Self::Text(Some(s)) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Integer(None) | Self::Text(None) => ToSqlOutput::Owned(Value::Null),
        })
    }
}

fn query_error(operation: &str, e: &rusqlite::Error) -> Error {
    Error::StoreQuery {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

fn connection_error(e: &rusqlite::Error) -> Error {
    Error::StoreConnection {
        backend: BACKEND.to_string(),
        cause: e.to_string(),
    }
}

/// Renders a stored value as cell text.
fn cell_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        },
    }
}

/// `SQLite` table store.
///
/// Holds one connection for the lifetime of a migration.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreConnection`] if the file cannot be opened or is
    /// not a database.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| connection_error(&e))?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreConnection`] if `SQLite` cannot allocate it.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| connection_error(&e))?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Verifies the file is a database and sets the busy timeout.
    fn initialize(&self) -> Result<()> {
        self.conn
            .query_row("SELECT count(*) FROM sqlite_master", [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|e| connection_error(&e))?;
        let _ = self.conn.pragma_update(None, "busy_timeout", "5000");
        Ok(())
    }
}

impl TableStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    fn table_exists(&self, table: &str) -> Result<bool> {
        timed(BACKEND, "table_exists", || {
            self.conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                    params![table],
                    |_| Ok(()),
                )
                .optional()
                .map(|found| found.is_some())
                .map_err(|e| query_error("table_exists", &e))
        })
    }

    fn execute(&self, statement: &Statement) -> Result<()> {
        timed(BACKEND, "execute", || {
            self.conn
                .execute(&statement.sql, params_from_iter(statement.params.iter()))
                .map(|_| ())
                .map_err(|e| query_error("execute", &e))
        })
    }

    #[instrument(skip_all, fields(backend = BACKEND, statements = statements.len()))]
    fn execute_in_transaction(&mut self, statements: &[Statement]) -> Result<()> {
        let conn = &mut self.conn;
        timed(BACKEND, "transaction", || {
            let tx = conn
                .transaction()
                .map_err(|e| query_error("begin", &e))?;
            for statement in statements {
                tx.execute(&statement.sql, params_from_iter(statement.params.iter()))
                    .map_err(|e| query_error("execute", &e))?;
            }
            tx.commit().map_err(|e| query_error("commit", &e))
        })
    }

    fn table_columns(&self, table: &str) -> Result<TableSchema> {
        timed(BACKEND, "table_columns", || {
            let mut stmt = self
                .conn
                .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
                .map_err(|e| query_error("table_columns", &e))?;
            let names = stmt
                .query_map(params![table], |row| row.get::<_, String>(0))
                .map_err(|e| query_error("table_columns", &e))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| query_error("table_columns", &e))?;
            Ok(TableSchema::new(names))
        })
    }

    #[instrument(skip(self, columns), fields(backend = BACKEND, columns = columns.len()))]
    fn table_rows(&self, table: &str, columns: &TableSchema) -> Result<Vec<TableRow>> {
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let sql = build_select_rows(SqlDialect::Sqlite, table, columns, &[]).sql;
        let width = columns.len();

        timed(BACKEND, "table_rows", || {
            let mut stmt = self
                .conn
                .prepare(&sql)
                .map_err(|e| query_error("table_rows", &e))?;
            let rows = stmt
                .query_map([], |row| {
                    (0..width)
                        .map(|i| row.get_ref(i).map(cell_text))
                        .collect::<rusqlite::Result<Vec<_>>>()
                        .map(TableRow::new)
                })
                .map_err(|e| query_error("table_rows", &e))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| query_error("table_rows", &e))?;
            Ok(rows)
        })
    }
}
