//! Core traits for reading and writing tables.
//!
//! Defines the [`TableSource`] and [`TableSink`] traits that format adapters
//! implement, one pair per [`Format`](super::Format).

use crate::Result;
use crate::models::{TableData, TableRow, TableSchema};

/// A parsed table that yields its rows one at a time.
///
/// The schema is known as soon as the source is constructed. Rows are
/// returned exactly as the format produced them; a row may be shorter or
/// longer than the schema.
pub trait TableSource {
    /// Returns the column names in source order.
    fn schema(&self) -> &TableSchema;

    /// Returns the next row, or `None` when the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input cannot be read or parsed.
    fn next_row(&mut self) -> Result<Option<TableRow>>;

    /// Returns the number of remaining rows if known.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

/// A destination that serializes rows in one format.
///
/// The header (column names) is written when the sink is created.
pub trait TableSink {
    /// Writes one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    fn write_row(&mut self, row: &TableRow) -> Result<()>;

    /// Writes any trailer and flushes the output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn finalize(self: Box<Self>) -> Result<()>;
}

/// Drains a source into owned [`TableData`].
///
/// # Errors
///
/// Returns the first error produced by the source.
pub fn read_all(source: &mut dyn TableSource) -> Result<TableData> {
    let mut rows = Vec::with_capacity(source.size_hint().unwrap_or(0));
    while let Some(row) = source.next_row()? {
        rows.push(row);
    }
    Ok(TableData::new(source.schema().clone(), rows))
}

/// Writes every row of `data` into `sink` and finalizes it.
///
/// # Errors
///
/// Returns the first error produced by the sink.
pub fn write_all(mut sink: Box<dyn TableSink + '_>, data: &TableData) -> Result<usize> {
    for row in &data.rows {
        sink.write_row(row)?;
    }
    sink.finalize()?;
    Ok(data.rows.len())
}
