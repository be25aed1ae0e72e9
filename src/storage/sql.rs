//! SQL statement builders.
//!
//! Table and column names are quoted identifiers; every cell value is a bound
//! parameter and never appears in the statement text.

use crate::models::{TableRow, TableSchema};
use crate::services::schema::{ColumnType, TableDefinition};
use crate::{Error, Result};

/// Placeholder and type conventions of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    /// `?N` placeholders.
    Sqlite,
    /// `$N` placeholders.
    Postgres,
}

impl SqlDialect {
    /// Returns the placeholder for the 1-based parameter `n`.
    #[must_use]
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Self::Sqlite => format!("?{n}"),
            Self::Postgres => format!("${n}"),
        }
    }

    /// Maximum number of bound parameters in one statement.
    #[must_use]
    pub const fn max_parameters(self) -> usize {
        match self {
            Self::Sqlite => 32_766,
            Self::Postgres => 65_535,
        }
    }

    /// Select-list expression reading `column` back as text.
    #[must_use]
    pub fn select_column(self, column: &str) -> String {
        match self {
            Self::Sqlite => quote_identifier(column),
            Self::Postgres => format!("{}::text", quote_identifier(column)),
        }
    }

    /// Column type for a [`ColumnType`].
    #[must_use]
    pub const fn column_type(self, column_type: ColumnType) -> &'static str {
        match (self, column_type) {
            (Self::Sqlite, ColumnType::IntegerKey) => "INTEGER PRIMARY KEY",
            (Self::Postgres, ColumnType::IntegerKey) => "BIGINT PRIMARY KEY",
            (_, ColumnType::Text) => "TEXT",
        }
    }
}

/// Quotes an identifier with double quotes, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A bound parameter value. Nulls keep their column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// Value for the integer key column.
    Integer(Option<i64>),
    /// Value for a text column.
    Text(Option<String>),
}

/// Statement text plus its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Bound values.
    pub params: Vec<SqlValue>,
}

impl Statement {
    /// Creates a statement without parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Builds the `CREATE TABLE` statement for a definition.
#[must_use]
pub fn build_create_table(dialect: SqlDialect, definition: &TableDefinition) -> Statement {
    let columns = definition
        .columns
        .iter()
        .map(|c| {
            format!(
                "{} {}",
                quote_identifier(&c.name),
                dialect.column_type(c.column_type)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    Statement::new(format!(
        "CREATE TABLE {} ({columns})",
        quote_identifier(&definition.table)
    ))
}

/// Builds multi-row `INSERT` statements for `rows`.
///
/// Rows must already be as wide as the definition. Each statement holds at
/// most `batch_rows` rows and stays under the dialect parameter limit.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if a value in the key column is not an
/// integer.
pub fn build_insert_batches(
    dialect: SqlDialect,
    definition: &TableDefinition,
    rows: &[TableRow],
    batch_rows: usize,
) -> Result<Vec<Statement>> {
    let width = definition.columns.len();
    if width == 0 || rows.is_empty() {
        return Ok(Vec::new());
    }
    let per_statement = batch_rows
        .min(dialect.max_parameters() / width)
        .max(1);

    let prefix = format!(
        "INSERT INTO {} ({}) VALUES ",
        quote_identifier(&definition.table),
        definition
            .column_names()
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut statements = Vec::with_capacity(rows.len().div_ceil(per_statement));
    for (chunk_index, chunk) in rows.chunks(per_statement).enumerate() {
        let mut sql = prefix.clone();
        let mut params = Vec::with_capacity(chunk.len() * width);
        for (offset, row) in chunk.iter().enumerate() {
            let row_number = chunk_index * per_statement + offset + 1;
            if offset > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (column_index, column) in definition.columns.iter().enumerate() {
                if column_index > 0 {
                    sql.push_str(", ");
                }
                params.push(bind_value(
                    column.column_type,
                    &column.name,
                    row.get(column_index),
                    row_number,
                )?);
                sql.push_str(&dialect.placeholder(params.len()));
            }
            sql.push(')');
        }
        statements.push(Statement { sql, params });
    }
    Ok(statements)
}

fn bind_value(
    column_type: ColumnType,
    column: &str,
    cell: Option<&str>,
    row_number: usize,
) -> Result<SqlValue> {
    match column_type {
        ColumnType::Text => Ok(SqlValue::Text(cell.map(str::to_string))),
        ColumnType::IntegerKey => match cell.map(str::trim) {
            None | Some("") => Ok(SqlValue::Integer(None)),
            Some(text) => text.parse::<i64>().map(|v| SqlValue::Integer(Some(v))).map_err(|_| {
                Error::malformed(
                    "table",
                    format!("row {row_number}: {column} value {text:?} is not an integer"),
                )
            }),
        },
    }
}

/// Builds the statement reading every row of `table` as text.
///
/// Rows come back sorted by `order_by` when it names key columns.
#[must_use]
pub fn build_select_rows(
    dialect: SqlDialect,
    table: &str,
    columns: &TableSchema,
    order_by: &[String],
) -> Statement {
    let mut sql = format!(
        "SELECT {} FROM {}",
        columns
            .columns()
            .iter()
            .map(|c| dialect.select_column(c))
            .collect::<Vec<_>>()
            .join(", "),
        quote_identifier(table)
    );
    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(
            &order_by
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
    Statement::new(sql)
}
