//! Delimited text adapter.
//!
//! Lines are split on raw occurrences of the delimiter with no quoting, so
//! only values free of the delimiter and of line breaks survive a round trip.

use super::{read_error, write_error};
use crate::io::traits::{TableSink, TableSource};
use crate::models::{TableRow, TableSchema};
use crate::{Error, Result};
use std::io::{BufRead, Write};

fn check_delimiter(delimiter: &str) -> Result<()> {
    if delimiter.is_empty() {
        return Err(Error::InvalidInput(
            "text delimiter must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Delimited text table source.
pub struct TxtTableSource<R: BufRead> {
    reader: R,
    delimiter: String,
    schema: TableSchema,
    line: Vec<u8>,
}

impl<R: BufRead> TxtTableSource<R> {
    /// Creates a text source and reads the header line.
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiter is empty or the first line cannot
    /// be read.
    pub fn new(reader: R, delimiter: &str) -> Result<Self> {
        check_delimiter(delimiter)?;
        let mut source = Self {
            reader,
            delimiter: delimiter.to_string(),
            schema: TableSchema::default(),
            line: Vec::new(),
        };
        if let Some(header) = source.read_line()? {
            source.schema = TableSchema::new(header.split(source.delimiter.as_str()));
        }
        Ok(source)
    }

    /// Reads one line with its `\n` or `\r\n` terminator removed.
    fn read_line(&mut self) -> Result<Option<String>> {
        self.line.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.line)
            .map_err(read_error)?;
        if read == 0 {
            return Ok(None);
        }
        if self.line.last() == Some(&b'\n') {
            self.line.pop();
            if self.line.last() == Some(&b'\r') {
                self.line.pop();
            }
        }
        let text = std::str::from_utf8(&self.line)
            .map_err(|e| Error::malformed("txt", e.to_string()))?;
        Ok(Some(text.to_string()))
    }
}

impl<R: BufRead> TableSource for TxtTableSource<R> {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn next_row(&mut self) -> Result<Option<TableRow>> {
        Ok(self
            .read_line()?
            .map(|line| TableRow::from_texts(line.split(self.delimiter.as_str()))))
    }
}

/// Delimited text table sink.
///
/// Every line, the header included, ends with `\n`.
pub struct TxtTableSink<W: Write> {
    writer: W,
    delimiter: String,
}

impl<W: Write> TxtTableSink<W> {
    /// Creates a text sink and writes the header line.
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiter is empty or the header cannot be
    /// written.
    pub fn new(writer: W, schema: &TableSchema, delimiter: &str) -> Result<Self> {
        check_delimiter(delimiter)?;
        let mut sink = Self {
            writer,
            delimiter: delimiter.to_string(),
        };
        sink.write_line(schema.columns().iter().map(String::as_str))?;
        Ok(sink)
    }

    fn write_line<'a>(&mut self, fields: impl Iterator<Item = &'a str>) -> Result<()> {
        let line = fields.collect::<Vec<_>>().join(&self.delimiter);
        self.writer.write_all(line.as_bytes()).map_err(write_error)?;
        self.writer.write_all(b"\n").map_err(write_error)
    }
}

impl<W: Write> TableSink for TxtTableSink<W> {
    fn write_row(&mut self, row: &TableRow) -> Result<()> {
        self.write_line(row.cells.iter().map(|c| c.as_deref().unwrap_or("")))
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        self.writer.flush().map_err(write_error)
    }
}
