//! CSV format adapter.
//!
//! Quote-aware in both directions: fields holding the delimiter, quotes or
//! line breaks survive a write/read cycle unchanged.

use super::{read_error, write_error};
use crate::io::traits::{TableSink, TableSource};
use crate::models::{TableRow, TableSchema};
use crate::{Error, Result};
use std::io::{BufRead, Write};

/// Converts a delimiter string into the single byte the `csv` crate needs.
fn delimiter_byte(delimiter: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(Error::InvalidInput(format!(
            "CSV delimiter must be a single ASCII character, got {delimiter:?}"
        ))),
    }
}

fn csv_error(e: csv::Error) -> Error {
    if e.is_io_error() {
        read_error(e)
    } else {
        Error::malformed("csv", e.to_string())
    }
}

/// CSV table source.
///
/// The first record is the header.
pub struct CsvTableSource<R: BufRead> {
    reader: csv::Reader<R>,
    schema: TableSchema,
    record: csv::StringRecord,
}

impl<R: BufRead> CsvTableSource<R> {
    /// Creates a CSV source and reads the header record.
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiter is not a single byte or the header
    /// cannot be read.
    pub fn new(reader: R, delimiter: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter_byte(delimiter)?)
            .from_reader(reader);

        let headers = csv_reader.headers().map_err(csv_error)?;
        let schema = TableSchema::new(headers.iter());

        Ok(Self {
            reader: csv_reader,
            schema,
            record: csv::StringRecord::new(),
        })
    }
}

impl<R: BufRead> TableSource for CsvTableSource<R> {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn next_row(&mut self) -> Result<Option<TableRow>> {
        let has_record = self
            .reader
            .read_record(&mut self.record)
            .map_err(csv_error)?;
        if !has_record {
            return Ok(None);
        }
        Ok(Some(TableRow::from_texts(self.record.iter())))
    }
}

/// CSV table sink.
///
/// Absent cells are written as empty fields.
pub struct CsvTableSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvTableSink<W> {
    /// Creates a CSV sink and writes the header record.
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiter is not a single byte or the header
    /// cannot be written.
    pub fn new(writer: W, schema: &TableSchema, delimiter: &str) -> Result<Self> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(delimiter_byte(delimiter)?)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(writer);
        csv_writer
            .write_record(schema.columns())
            .map_err(write_error)?;
        Ok(Self { writer: csv_writer })
    }
}

impl<W: Write> TableSink for CsvTableSink<W> {
    fn write_row(&mut self, row: &TableRow) -> Result<()> {
        self.writer
            .write_record(row.cells.iter().map(|c| c.as_deref().unwrap_or("")))
            .map_err(write_error)
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        self.writer.flush().map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::traits::read_all;
    use std::io::Cursor;

    #[test]
    fn test_csv_reads_header_and_rows() {
        let input = "id,name\n1,Alice\n2,Bob\n";
        let mut source = CsvTableSource::new(Cursor::new(input), ",").unwrap();
        let data = read_all(&mut source).unwrap();

        assert_eq!(data.schema.columns(), ["id", "name"]);
        assert_eq!(
            data.rows,
            vec![
                TableRow::from_texts(["1", "Alice"]),
                TableRow::from_texts(["2", "Bob"])
            ]
        );
    }

    #[test]
    fn test_csv_quoted_fields() {
        let input = "a;b\n\"x;y\";\"say \"\"hi\"\"\nthere\"\n";
        let mut source = CsvTableSource::new(Cursor::new(input), ";").unwrap();
        let row = source.next_row().unwrap().unwrap();
        assert_eq!(row.get(0), Some("x;y"));
        assert_eq!(row.get(1), Some("say \"hi\"\nthere"));
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_csv_keeps_ragged_rows() {
        let input = "a,b,c\n1,2\n1,2,3,4\n";
        let mut source = CsvTableSource::new(Cursor::new(input), ",").unwrap();
        assert_eq!(source.next_row().unwrap().unwrap().len(), 2);
        assert_eq!(source.next_row().unwrap().unwrap().len(), 4);
    }

    #[test]
    fn test_csv_rejects_multibyte_delimiter() {
        let result = CsvTableSource::new(Cursor::new("a\n"), "::");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_csv_sink_quotes_when_needed() {
        let schema = TableSchema::new(["id", "note"]);
        let mut out = Vec::new();
        let mut sink = Box::new(CsvTableSink::new(&mut out, &schema, ",").unwrap());
        sink.write_row(&TableRow::from_texts(["1", "a,b"])).unwrap();
        sink.write_row(&TableRow::new(vec![Some("2".to_string()), None]))
            .unwrap();
        sink.finalize().unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "id,note\n1,\"a,b\"\n2,\n");
    }
}
