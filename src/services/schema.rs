//! Schema inference.
//!
//! Turns the column names of a parsed file into a typed table definition:
//! a column named `id` (any case) becomes an integer primary key, every
//! other column is unbounded text.

use crate::models::TableSchema;
use crate::{Error, Result};
use std::collections::HashSet;

/// Storage type of an inferred column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 64-bit integer primary key.
    IntegerKey,
    /// Unbounded text.
    Text,
}

/// One column of an inferred table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name, case preserved.
    pub name: String,
    /// Storage type.
    pub column_type: ColumnType,
}

/// A table ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    /// Table name.
    pub table: String,
    /// Columns in source order.
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Returns the index of the integer key column, if any.
    #[must_use]
    pub fn key_index(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.column_type == ColumnType::IntegerKey)
    }

    /// Returns the column names.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Infers a table definition from parsed column names.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an empty table name and
/// [`Error::MalformedInput`] when there are no columns, a column name is
/// empty, or two names differ only by case.
pub fn infer_definition(table: &str, schema: &TableSchema) -> Result<TableDefinition> {
    if table.trim().is_empty() {
        return Err(Error::InvalidInput("table name must not be empty".to_string()));
    }
    if schema.is_empty() {
        return Err(Error::malformed("schema", "the source has no columns"));
    }

    let mut seen = HashSet::with_capacity(schema.len());
    let mut columns = Vec::with_capacity(schema.len());
    for (index, name) in schema.columns().iter().enumerate() {
        if name.trim().is_empty() {
            return Err(Error::malformed(
                "schema",
                format!("column {} has an empty name", index + 1),
            ));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(Error::malformed(
                "schema",
                format!("column {name:?} appears more than once"),
            ));
        }
        let column_type = if name.eq_ignore_ascii_case("id") {
            ColumnType::IntegerKey
        } else {
            ColumnType::Text
        };
        columns.push(ColumnDefinition {
            name: name.clone(),
            column_type,
        });
    }

    tracing::debug!(
        table,
        columns = columns.len(),
        keyed = columns.iter().any(|c| c.column_type == ColumnType::IntegerKey),
        "Inferred table definition"
    );

    Ok(TableDefinition {
        table: table.to_string(),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_column_is_integer_key() {
        let def = infer_definition("people", &TableSchema::new(["ID", "name"])).unwrap();
        assert_eq!(def.columns[0].column_type, ColumnType::IntegerKey);
        assert_eq!(def.columns[0].name, "ID");
        assert_eq!(def.columns[1].column_type, ColumnType::Text);
        assert_eq!(def.key_index(), Some(0));
    }

    #[test]
    fn test_no_key_without_id() {
        let def = infer_definition("t", &TableSchema::new(["uid", "ident"])).unwrap();
        assert_eq!(def.key_index(), None);
        assert_eq!(def.column_names().collect::<Vec<_>>(), ["uid", "ident"]);
    }

    #[test]
    fn test_rejects_bad_columns() {
        for columns in [vec![], vec!["a", ""], vec!["Name", "name"]] {
            let err = infer_definition("t", &TableSchema::new(columns)).unwrap_err();
            assert!(matches!(err, Error::MalformedInput { .. }));
        }
    }

    #[test]
    fn test_rejects_empty_table_name() {
        let err = infer_definition(" ", &TableSchema::new(["a"])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
