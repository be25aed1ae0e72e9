//! Tabular data passed between readers, stores and writers.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A single cell value.
///
/// `None` is an absent cell (missing JSON key, missing XML attribute, SQL
/// `NULL`), which is distinct from an empty string.
pub type Cell = Option<String>;

/// Ordered column names, in first-seen order of the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<String>,
}

impl TableSchema {
    /// Creates a schema from column names.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Finds a column by case-insensitive name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }
}

/// One row of cells, positionally aligned with a [`TableSchema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    /// Cell values in column order.
    pub cells: Vec<Cell>,
}

impl TableRow {
    /// Creates a row from cells.
    #[must_use]
    pub const fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Creates a row where every cell is present.
    #[must_use]
    pub fn from_texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: values.into_iter().map(|v| Some(v.into())).collect(),
        }
    }

    /// Returns the number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the row has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cell text at `index`, or `None` when absent.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(Option::as_deref)
    }
}

/// How rows whose length differs from the schema are handled on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaggedRows {
    /// Fail the import with `malformed-input`.
    #[default]
    Reject,
    /// Pad short rows with absent cells and truncate long rows.
    #[serde(alias = "truncate")]
    Pad,
}

impl fmt::Display for RaggedRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Pad => write!(f, "pad"),
        }
    }
}

impl FromStr for RaggedRows {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "pad" | "truncate" => Ok(Self::Pad),
            _ => Err(Error::InvalidInput(format!(
                "unknown ragged row policy: {s} (expected reject or pad)"
            ))),
        }
    }
}

/// A schema and its rows, owned for the duration of one migration call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    /// Column names.
    pub schema: TableSchema,
    /// Rows in source order.
    pub rows: Vec<TableRow>,
}

impl TableData {
    /// Creates table data from a schema and rows.
    #[must_use]
    pub const fn new(schema: TableSchema, rows: Vec<TableRow>) -> Self {
        Self { schema, rows }
    }

    /// Makes every row as wide as the schema according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] under [`RaggedRows::Reject`] when a
    /// row is shorter or longer than the schema. Rows are numbered from 1.
    pub fn conform(&mut self, policy: RaggedRows) -> Result<()> {
        let width = self.schema.len();
        for (index, row) in self.rows.iter_mut().enumerate() {
            if row.len() == width {
                continue;
            }
            match policy {
                RaggedRows::Reject => {
                    return Err(Error::malformed(
                        "table",
                        format!(
                            "row {} has {} cells but there are {width} columns",
                            index + 1,
                            row.len()
                        ),
                    ));
                },
                RaggedRows::Pad => {
                    tracing::warn!(
                        row = index + 1,
                        cells = row.len(),
                        columns = width,
                        "Resizing ragged row"
                    );
                    row.cells.resize(width, None);
                },
            }
        }
        Ok(())
    }
}
