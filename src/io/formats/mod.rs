//! Format adapters for import/export.
//!
//! Each format implements [`TableSource`] and [`TableSink`].

pub mod csv;
pub mod json;
pub mod txt;
pub mod xml;

use crate::models::{TableData, TableSchema};
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use std::str::FromStr;

use super::traits::{TableSink, TableSource, read_all, write_all};

/// Placeholder path used by adapters, which only see a stream.
const STREAM: &str = "<stream>";

/// Error for a failed read inside an adapter. [`read_table`] fills in the path.
pub(crate) fn read_error(cause: impl std::fmt::Display) -> Error {
    Error::FileRead {
        path: STREAM.to_string(),
        cause: cause.to_string(),
    }
}

/// Error for a failed write inside an adapter. [`write_table`] fills in the path.
pub(crate) fn write_error(cause: impl std::fmt::Display) -> Error {
    Error::FileCreate {
        path: STREAM.to_string(),
        cause: cause.to_string(),
    }
}

fn with_path(err: Error, path: &Path) -> Error {
    match err {
        Error::FileRead { cause, .. } => Error::file_read(path, cause),
        Error::FileCreate { cause, .. } => Error::file_create(path, cause),
        other => other,
    }
}

/// Supported tabular file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Quote-aware comma separated values.
    Csv,
    /// Delimited text without quoting.
    #[default]
    Txt,
    /// Array of flat JSON objects.
    Json,
    /// The `<table>` XML dialect.
    Xml,
}

impl Format {
    /// Returns all formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Csv, Self::Txt, Self::Json, Self::Xml]
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// Detects the format of a source file from its extension.
    ///
    /// `.csv`, `.json` and `.xml` (any case) select those formats; every
    /// other extension, or none, is delimited text.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("csv") => Self::Csv,
            Some("json") => Self::Json,
            Some("xml") => Self::Xml,
            _ => Self::Txt,
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "txt" | "text" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            _ => Err(Error::InvalidInput(format!(
                "unknown format: {s} (expected txt, csv, json or xml)"
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Creates a table source for the given format and reader.
///
/// `delimiter` applies to CSV and TXT only.
///
/// # Errors
///
/// Returns an error if the delimiter is unusable for the format or the
/// header cannot be parsed.
pub fn create_table_source<'a, R: BufRead + 'a>(
    reader: R,
    format: Format,
    delimiter: &str,
) -> Result<Box<dyn TableSource + 'a>> {
    match format {
        Format::Csv => Ok(Box::new(csv::CsvTableSource::new(reader, delimiter)?)),
        Format::Txt => Ok(Box::new(txt::TxtTableSource::new(reader, delimiter)?)),
        Format::Json => Ok(Box::new(json::JsonTableSource::new(reader)?)),
        Format::Xml => Ok(Box::new(xml::XmlTableSource::new(reader)?)),
    }
}

/// Creates a table sink for the given format and writer.
///
/// # Errors
///
/// Returns an error if the delimiter or a column name is unusable for the
/// format, or the header cannot be written.
pub fn create_table_sink<'a, W: Write + 'a>(
    writer: W,
    format: Format,
    schema: &TableSchema,
    delimiter: &str,
) -> Result<Box<dyn TableSink + 'a>> {
    match format {
        Format::Csv => Ok(Box::new(csv::CsvTableSink::new(writer, schema, delimiter)?)),
        Format::Txt => Ok(Box::new(txt::TxtTableSink::new(writer, schema, delimiter)?)),
        Format::Json => Ok(Box::new(json::JsonTableSink::new(writer, schema)?)),
        Format::Xml => Ok(Box::new(xml::XmlTableSink::new(writer, schema)?)),
    }
}

/// Reads a whole table from a file.
///
/// # Errors
///
/// Returns [`Error::FileRead`] if the file cannot be opened or read, and
/// [`Error::MalformedInput`] if it cannot be parsed.
pub fn read_table(path: &Path, format: Format, delimiter: &str) -> Result<TableData> {
    let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
    let reader = BufReader::new(file);
    let mut source =
        create_table_source(reader, format, delimiter).map_err(|e| with_path(e, path))?;
    read_all(source.as_mut()).map_err(|e| with_path(e, path))
}

/// Writes a table into a new file.
///
/// The file is created exclusively; an existing file is never touched. If
/// writing fails part way, the partial file is removed.
///
/// # Errors
///
/// Returns [`Error::FileExists`] if `path` already exists and
/// [`Error::FileCreate`] if it cannot be created or written.
pub fn write_table(path: &Path, data: &TableData, format: Format, delimiter: &str) -> Result<usize> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                Error::FileExists {
                    path: path.display().to_string(),
                }
            } else {
                Error::file_create(path, e)
            }
        })?;

    let result = create_table_sink(BufWriter::new(file), format, &data.schema, delimiter)
        .and_then(|sink| write_all(sink, data));

    result.map_err(|e| {
        if let Err(remove) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %remove, "Failed to remove partial export");
        }
        with_path(e, path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableRow;
    use test_case::test_case;

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("json").unwrap(), Format::Json);
        assert_eq!(Format::from_str("XML").unwrap(), Format::Xml);
        assert_eq!(Format::from_str(".csv").unwrap(), Format::Csv);
        assert_eq!(Format::from_str("txt").unwrap(), Format::Txt);
        assert!(Format::from_str("yaml").is_err());
    }

    #[test_case("people.csv" => Format::Csv)]
    #[test_case("people.JSON" => Format::Json)]
    #[test_case("people.xml" => Format::Xml)]
    #[test_case("people.txt" => Format::Txt)]
    #[test_case("people.tsv" => Format::Txt)]
    #[test_case("people" => Format::Txt)]
    fn test_format_from_path(path: &str) -> Format {
        Format::from_path(Path::new(path))
    }

    #[test]
    fn test_format_display_is_extension() {
        for format in Format::all() {
            assert_eq!(format.to_string(), format.extension());
        }
        assert_eq!(Format::default(), Format::Txt);
    }

    #[test]
    fn test_read_table_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        let err = read_table(&path, Format::Csv, ",").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn test_write_table_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "keep me").unwrap();

        let data = TableData::new(
            TableSchema::new(["a"]),
            vec![TableRow::from_texts(["1"])],
        );
        let err = write_table(&path, &data, Format::Txt, ",").unwrap_err();
        assert!(matches!(err, Error::FileExists { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn test_write_table_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        let data = TableData::new(TableSchema::new(["bad name"]), Vec::new());

        let err = write_table(&path, &data, Format::Xml, ",").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!path.exists());
    }
}
