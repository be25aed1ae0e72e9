//! Table store contract.

use super::sql::{SqlDialect, Statement};
use crate::Result;
use crate::models::{TableData, TableRow, TableSchema};

/// A relational store that tables are imported into and exported from.
///
/// One store instance serves one migration; implementations hold a single
/// connection and no pool.
///
/// # Implementor Notes
///
/// - Table and column names come from untrusted files and must only reach
///   SQL text through [`quote_identifier`](super::sql::quote_identifier)
/// - Connection failures map to `Error::StoreConnection`, statement failures
///   to `Error::StoreQuery`
/// - `table_rows` returns cells in the order given by `columns`, `NULL`
///   becoming `None`, and rows in integer key order when the table has one
pub trait TableStore {
    /// Backend name used in logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Placeholder and type conventions of this backend.
    fn dialect(&self) -> SqlDialect;

    /// Returns true if `table` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be queried.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Executes one statement outside any explicit transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    fn execute(&self, statement: &Statement) -> Result<()>;

    /// Executes all statements in one transaction.
    ///
    /// Either every statement takes effect or none does.
    ///
    /// # Errors
    ///
    /// Returns the first failure after rolling back.
    fn execute_in_transaction(&mut self, statements: &[Statement]) -> Result<()>;

    /// Returns the column names of `table` in definition order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be queried.
    fn table_columns(&self, table: &str) -> Result<TableSchema>;

    /// Returns every row of `table`, projected onto `columns`.
    ///
    /// # Errors
    ///
    /// Returns an error if the select fails.
    fn table_rows(&self, table: &str, columns: &TableSchema) -> Result<Vec<TableRow>>;

    /// Reads the whole table.
    ///
    /// # Errors
    ///
    /// Returns an error if the columns or rows cannot be read.
    fn read_table(&self, table: &str) -> Result<TableData> {
        let schema = self.table_columns(table)?;
        let rows = self.table_rows(table, &schema)?;
        Ok(TableData::new(schema, rows))
    }
}
