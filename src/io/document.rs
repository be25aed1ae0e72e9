//! Handle to a tabular document on disk.

use super::formats::{Format, read_table, write_error};
use crate::models::TableData;
use crate::services::Migration;
use crate::storage::TableStore;
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extensions treated as images, which cannot be shown or migrated.
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "ico", "svg",
];

/// Shown in place of an empty or absent cell.
const EMPTY_CELL: &str = "-";

/// A readable tabular file.
///
/// Returned by a successful export and accepted by the `show` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    format: Format,
}

impl Document {
    /// Opens an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongPath`] if nothing exists at `path`, and
    /// [`Error::InvalidInput`] if it is a directory or an image.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let meta = std::fs::metadata(&path).map_err(|_| Error::WrongPath {
            path: path.display().to_string(),
        })?;
        if meta.is_dir() {
            return Err(Error::InvalidInput(format!(
                "{} is a directory, not a document",
                path.display()
            )));
        }
        if is_image(&path) {
            return Err(Error::InvalidInput(format!(
                "{} is an image, not a tabular document",
                path.display()
            )));
        }
        let format = Format::from_path(&path);
        Ok(Self { path, format })
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the format detected from the extension.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Parses the document.
    ///
    /// # Errors
    ///
    /// Returns a read or parse error.
    pub fn read(&self, delimiter: &str) -> Result<TableData> {
        read_table(&self.path, self.format, delimiter)
    }

    /// Writes the document contents as plain text.
    ///
    /// Delimited text is copied verbatim. Other formats are parsed and laid
    /// out in aligned columns, with `-` for empty cells.
    ///
    /// # Errors
    ///
    /// Returns a read, parse or write error.
    pub fn render<W: Write>(&self, out: &mut W, delimiter: &str) -> Result<()> {
        if self.format == Format::Txt {
            let bytes = std::fs::read(&self.path).map_err(|e| Error::file_read(&self.path, e))?;
            return out.write_all(&bytes).map_err(write_error);
        }

        let data = self.read(delimiter)?;
        let mut lines = Vec::with_capacity(data.rows.len() + 1);
        lines.push(data.schema.columns().to_vec());
        lines.extend(data.rows.iter().map(|row| {
            row.cells
                .iter()
                .map(|c| match c.as_deref() {
                    Some("") | None => EMPTY_CELL.to_string(),
                    Some(text) => text.replace('\n', " "),
                })
                .collect::<Vec<_>>()
        }));

        let widths = column_widths(&lines);
        for line in &lines {
            let padded: Vec<String> = line
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let width = widths.get(i).copied().unwrap_or(0);
                    format!("{cell:<width$}")
                })
                .collect();
            writeln!(out, "{}", padded.join("  ").trim_end()).map_err(write_error)?;
        }
        Ok(())
    }

    /// Builds a migration of this document into `table`.
    #[must_use]
    pub fn migrate(&self, table: &str, store: Box<dyn TableStore>) -> Migration {
        Migration::new(&self.path, table, store)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|i| ext.eq_ignore_ascii_case(i)))
}

fn column_widths(lines: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = Vec::new();
    for line in lines {
        for (i, cell) in line.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_missing_directory_and_image() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("logo.PNG");
        std::fs::write(&image, [0u8; 4]).unwrap();

        assert!(matches!(
            Document::open(dir.path().join("missing.csv")),
            Err(Error::WrongPath { .. })
        ));
        assert!(matches!(
            Document::open(dir.path()),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(Document::open(&image), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_render_csv_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "id,name\n1,Alice\n22,\n").unwrap();

        let doc = Document::open(&path).unwrap();
        assert_eq!(doc.format(), Format::Csv);
        let mut out = Vec::new();
        doc.render(&mut out, ",").unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id  name\n1   Alice\n22  -\n"
        );
    }

    #[test]
    fn test_render_txt_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.log");
        std::fs::write(&path, "a|b\n1|2").unwrap();

        let mut out = Vec::new();
        Document::open(&path).unwrap().render(&mut out, "|").unwrap();
        assert_eq!(out, b"a|b\n1|2");
    }
}
