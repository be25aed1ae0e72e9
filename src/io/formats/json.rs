//! JSON format adapter.
//!
//! The document is an array of flat objects. Columns come from the key order
//! of the first object and every later object is projected onto them.

use super::{read_error, write_error};
use crate::io::traits::{TableSink, TableSource};
use crate::models::{Cell, TableRow, TableSchema};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::io::{BufRead, Write};

/// JSON table source.
pub struct JsonTableSource {
    schema: TableSchema,
    objects: std::vec::IntoIter<Value>,
    index: usize,
}

impl JsonTableSource {
    /// Parses a JSON array of objects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] if the document is not valid JSON or
    /// is not an array, or if its first element is not an object.
    pub fn new<R: BufRead>(reader: R) -> Result<Self> {
        let document: Value = serde_json::from_reader(reader).map_err(|e| {
            if e.is_io() {
                read_error(e)
            } else {
                Error::malformed("json", e.to_string())
            }
        })?;

        let Value::Array(objects) = document else {
            return Err(Error::malformed(
                "json",
                "top-level value must be an array of objects",
            ));
        };

        let schema = match objects.first() {
            Some(Value::Object(first)) => TableSchema::new(first.keys().cloned()),
            Some(_) => {
                return Err(Error::malformed("json", "element 1 is not an object"));
            },
            None => TableSchema::default(),
        };

        Ok(Self {
            schema,
            objects: objects.into_iter(),
            index: 0,
        })
    }

    fn project(&self, object: &Map<String, Value>) -> TableRow {
        let cells = self
            .schema
            .columns()
            .iter()
            .map(|column| object.get(column).and_then(value_to_cell))
            .collect();
        for key in object.keys() {
            if !self.schema.columns().contains(key) {
                tracing::debug!(key = %key, element = self.index, "Ignoring JSON key outside first object");
            }
        }
        TableRow::new(cells)
    }
}

/// Converts a JSON value to cell text. `null` is an absent cell.
fn value_to_cell(value: &Value) -> Cell {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

impl TableSource for JsonTableSource {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn next_row(&mut self) -> Result<Option<TableRow>> {
        let Some(value) = self.objects.next() else {
            return Ok(None);
        };
        self.index += 1;
        match value {
            Value::Object(object) => Ok(Some(self.project(&object))),
            _ => Err(Error::malformed(
                "json",
                format!("element {} is not an object", self.index),
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.objects.len())
    }
}

/// JSON table sink.
///
/// Writes one object per line inside a top-level array. Absent cells are
/// written as `null`.
pub struct JsonTableSink<W: Write> {
    writer: W,
    columns: Vec<String>,
    rows_written: usize,
}

impl<W: Write> JsonTableSink<W> {
    /// Creates a JSON sink and opens the array.
    ///
    /// # Errors
    ///
    /// Returns an error if the opening bracket cannot be written.
    pub fn new(mut writer: W, schema: &TableSchema) -> Result<Self> {
        writer.write_all(b"[").map_err(write_error)?;
        Ok(Self {
            writer,
            columns: schema.columns().to_vec(),
            rows_written: 0,
        })
    }
}

impl<W: Write> TableSink for JsonTableSink<W> {
    fn write_row(&mut self, row: &TableRow) -> Result<()> {
        let object: Map<String, Value> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let value = row
                    .cells
                    .get(i)
                    .cloned()
                    .flatten()
                    .map_or(Value::Null, Value::String);
                (column.clone(), value)
            })
            .collect();

        let separator: &[u8] = if self.rows_written == 0 { b"\n" } else { b",\n" };
        self.writer.write_all(separator).map_err(write_error)?;
        serde_json::to_writer(&mut self.writer, &object).map_err(write_error)?;
        self.rows_written += 1;
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        let trailer: &[u8] = if self.rows_written == 0 { b"]\n" } else { b"\n]\n" };
        self.writer.write_all(trailer).map_err(write_error)?;
        self.writer.flush().map_err(write_error)
    }
}
