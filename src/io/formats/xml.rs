//! XML table dialect adapter.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <table>
//!   <columns>
//!     <col name="id"/>
//!     <col name="name"/>
//!   </columns>
//!   <rows>
//!     <row id="1" name="Alice"/>
//!   </rows>
//! </table>
//! ```
//!
//! Element names and row attribute names are matched case-insensitively.
//! An absent attribute is an absent cell.
//!
//! `<col name>` holds the column name verbatim. Row attribute keys spell
//! each character that cannot appear in an XML name as `_xHHHH_` (its
//! code point in hex), so `first name` becomes `first_x0020_name`. An
//! underscore that would start such a sequence is itself escaped.

use super::{read_error, write_error};
use crate::io::traits::{TableSink, TableSource};
use crate::models::{TableRow, TableSchema};
use crate::{Error, Result};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fmt::Write as _;
use std::io::{BufRead, Write};

/// Which block of the document the parser is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Section {
    #[default]
    Outside,
    Columns,
    Rows,
}

/// Collects columns and raw row attributes in encounter order.
///
/// Fed one element at a time by the pull loop in [`XmlTableSource::new`],
/// then projected into rows once the document is complete.
#[derive(Debug, Default)]
struct XmlTableAccumulator {
    section: Section,
    columns: Vec<String>,
    rows: Vec<Vec<(String, String)>>,
}

impl XmlTableAccumulator {
    fn start(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let name = element.local_name();
        let name = name.as_ref();
        if name.eq_ignore_ascii_case(b"columns") {
            self.section = Section::Columns;
        } else if name.eq_ignore_ascii_case(b"rows") {
            self.section = Section::Rows;
        } else if name.eq_ignore_ascii_case(b"col") && self.section == Section::Columns {
            let column = attributes(element)?
                .into_iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("name"))
                .map(|(_, value)| value)
                .ok_or_else(|| {
                    Error::malformed(
                        "xml",
                        format!("<col> {} has no name attribute", self.columns.len() + 1),
                    )
                })?;
            self.columns.push(column);
        } else if name.eq_ignore_ascii_case(b"row") && self.section == Section::Rows {
            self.rows.push(attributes(element)?);
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        if name.eq_ignore_ascii_case(b"columns") || name.eq_ignore_ascii_case(b"rows") {
            self.section = Section::Outside;
        }
    }

    fn into_table(self) -> (TableSchema, Vec<TableRow>) {
        let schema = TableSchema::new(self.columns);
        let rows = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(index, attrs)| project_row(&schema, index, attrs))
            .collect();
        (schema, rows)
    }
}

fn project_row(schema: &TableSchema, index: usize, attrs: Vec<(String, String)>) -> TableRow {
    let mut cells = vec![None; schema.len()];
    for (key, value) in attrs {
        match schema.position(&key) {
            Some(column) => cells[column] = Some(value),
            None => {
                tracing::warn!(row = index + 1, attribute = %key, "Ignoring XML attribute with no matching column");
            },
        }
    }
    TableRow::new(cells)
}

fn attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    element
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| Error::malformed("xml", e.to_string()))?;
            let local_name = attr.key.local_name();
            let key = std::str::from_utf8(local_name.as_ref())
                .map_err(|e| Error::malformed("xml", e.to_string()))?;
            let key = decode_name(key).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::malformed("xml", e.to_string()))?
                .into_owned();
            Ok((key, value))
        })
        .collect()
}

/// XML table source.
///
/// The whole document is pulled through the accumulator on construction.
pub struct XmlTableSource {
    schema: TableSchema,
    rows: std::vec::IntoIter<TableRow>,
}

impl XmlTableSource {
    /// Parses an XML table document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] for XML syntax errors or a `<col>`
    /// without a `name` attribute.
    pub fn new<R: BufRead>(reader: R) -> Result<Self> {
        let mut reader = Reader::from_reader(reader);
        let mut accumulator = XmlTableAccumulator::default();
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| match e {
                quick_xml::Error::Io(io) => read_error(io),
                other => Error::malformed(
                    "xml",
                    format!("{other} at byte {}", reader.buffer_position()),
                ),
            })?;
            match event {
                Event::Start(element) | Event::Empty(element) => accumulator.start(&element)?,
                Event::End(element) => accumulator.end(element.local_name().as_ref()),
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        let (schema, rows) = accumulator.into_table();
        Ok(Self {
            schema,
            rows: rows.into_iter(),
        })
    }
}

impl TableSource for XmlTableSource {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn next_row(&mut self) -> Result<Option<TableRow>> {
        Ok(self.rows.next())
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.rows.len())
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Encodes a column name as an XML attribute name.
fn encode_name(name: &str) -> Cow<'_, str> {
    let needs_escape = |(i, c): (usize, char)| {
        let valid = if i == 0 { is_name_start(c) } else { is_name_char(c) };
        !valid || (c == '_' && name[i + 1..].starts_with('x'))
    };
    if !name.is_empty() && !name.char_indices().any(&needs_escape) {
        return Cow::Borrowed(name);
    }

    let mut encoded = String::with_capacity(name.len() + 8);
    for (i, c) in name.char_indices() {
        if needs_escape((i, c)) {
            let _ = write!(encoded, "_x{:04X}_", u32::from(c));
        } else {
            encoded.push(c);
        }
    }
    if encoded.is_empty() {
        encoded.push('_');
    }
    Cow::Owned(encoded)
}

/// Reverses [`encode_name`]. Text that is not a well-formed escape is kept.
fn decode_name(name: &str) -> Cow<'_, str> {
    if !name.contains("_x") {
        return Cow::Borrowed(name);
    }

    let mut decoded = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(start) = rest.find("_x") {
        decoded.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let escaped = tail.find('_').and_then(|end| {
            let hex = &tail[..end];
            if !(4..=6).contains(&hex.len()) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(|c| (c, end))
        });
        match escaped {
            Some((c, end)) => {
                decoded.push(c);
                rest = &tail[end + 1..];
            },
            None => {
                decoded.push('_');
                rest = &rest[start + 1..];
            },
        }
    }
    decoded.push_str(rest);
    Cow::Owned(decoded)
}

/// Escapes an attribute value, including whitespace that XML parsers would
/// otherwise normalize.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn attribute<'a>(name: &'a str, value: &str) -> Attribute<'a> {
    Attribute {
        key: QName(name.as_bytes()),
        value: Cow::Owned(escape_attribute(value).into_bytes()),
    }
}

/// XML table sink.
pub struct XmlTableSink<W: Write> {
    writer: Writer<W>,
    /// Encoded row attribute key per column.
    keys: Vec<String>,
}

impl<W: Write> XmlTableSink<W> {
    /// Creates an XML sink and writes the declaration and `<columns>` block.
    ///
    /// # Errors
    ///
    /// Returns a write error.
    pub fn new(writer: W, schema: &TableSchema) -> Result<Self> {
        let mut writer = Writer::new_with_indent(writer, b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        writer
            .write_event(Event::Start(BytesStart::new("table")))
            .map_err(write_error)?;
        writer
            .write_event(Event::Start(BytesStart::new("columns")))
            .map_err(write_error)?;
        for column in schema.columns() {
            let mut col = BytesStart::new("col");
            col.push_attribute(attribute("name", column));
            writer.write_event(Event::Empty(col)).map_err(write_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("columns")))
            .map_err(write_error)?;
        writer
            .write_event(Event::Start(BytesStart::new("rows")))
            .map_err(write_error)?;

        Ok(Self {
            writer,
            keys: schema
                .columns()
                .iter()
                .map(|c| encode_name(c).into_owned())
                .collect(),
        })
    }
}

impl<W: Write> TableSink for XmlTableSink<W> {
    fn write_row(&mut self, row: &TableRow) -> Result<()> {
        let mut element = BytesStart::new("row");
        for (i, key) in self.keys.iter().enumerate() {
            if let Some(value) = row.get(i) {
                element.push_attribute(attribute(key, value));
            }
        }
        self.writer
            .write_event(Event::Empty(element))
            .map_err(write_error)
    }

    fn finalize(mut self: Box<Self>) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new("rows")))
            .map_err(write_error)?;
        self.writer
            .write_event(Event::End(BytesEnd::new("table")))
            .map_err(write_error)?;
        let mut inner = self.writer.into_inner();
        inner.write_all(b"\n").map_err(write_error)?;
        inner.flush().map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::traits::read_all;
    use std::io::Cursor;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TABLE>
  <COLUMNS><COL NAME="id"/><col name="Name"></col><col name="note"/></COLUMNS>
  <rows>
    <ROW ID="1" NAME="Alice" NOTE="a &amp; b"/>
    <row id="2" name="Bob" color="red"/>
  </rows>
</TABLE>"#;

    #[test]
    fn test_xml_case_insensitive_names() {
        let mut source = XmlTableSource::new(Cursor::new(DOC)).unwrap();
        let data = read_all(&mut source).unwrap();

        assert_eq!(data.schema.columns(), ["id", "Name", "note"]);
        assert_eq!(
            data.rows[0],
            TableRow::from_texts(["1", "Alice", "a & b"])
        );
        assert_eq!(
            data.rows[1].cells,
            vec![Some("2".to_string()), Some("Bob".to_string()), None]
        );
    }

    #[test]
    fn test_xml_col_without_name() {
        let doc = "<table><columns><col label=\"x\"/></columns><rows/></table>";
        let result = XmlTableSource::new(Cursor::new(doc));
        assert!(matches!(result, Err(Error::MalformedInput { .. })));
    }

    #[test]
    fn test_xml_mismatched_tags() {
        let doc = "<table><columns><col name=\"x\"/></rows></table>";
        let result = XmlTableSource::new(Cursor::new(doc));
        assert!(matches!(result, Err(Error::MalformedInput { .. })));
    }

    #[test]
    fn test_xml_sink_escapes_values() {
        let schema = TableSchema::new(["id", "note"]);
        let mut out = Vec::new();
        let mut sink = Box::new(XmlTableSink::new(&mut out, &schema).unwrap());
        sink.write_row(&TableRow::from_texts(["1", "<\"a\"\nb>"]))
            .unwrap();
        sink.write_row(&TableRow::new(vec![Some("2".to_string()), None]))
            .unwrap();
        sink.finalize().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains(r#"<col name="note"/>"#));
        assert!(text.contains(r#"<row id="1" note="&lt;&quot;a&quot;&#10;b&gt;"/>"#));
        assert!(text.contains(r#"<row id="2"/>"#));

        let mut source = XmlTableSource::new(Cursor::new(text)).unwrap();
        let data = read_all(&mut source).unwrap();
        assert_eq!(data.rows[0].get(1), Some("<\"a\"\nb>"));
        assert_eq!(data.rows[1].get(1), None);
    }

    #[test]
    fn test_encode_name() {
        assert_eq!(encode_name("name"), "name");
        assert_eq!(encode_name("first name"), "first_x0020_name");
        assert_eq!(encode_name("2024"), "_x0032_024");
        assert_eq!(encode_name("a:b"), "a_x003A_b");
        assert_eq!(encode_name("_xml"), "_x005F_xml");
        assert_eq!(encode_name("snake_case"), "snake_case");
    }

    #[test]
    fn test_decode_name_reverses_encode() {
        for name in ["first name", "2024", "a_x0041_", "_xml", "x_", "\u{1F600}", "é-1"] {
            assert_eq!(decode_name(&encode_name(name)), name);
        }
        assert_eq!(decode_name("a_xZZ_b"), "a_xZZ_b");
        assert_eq!(decode_name("first_x0020_NAME"), "first NAME");
    }

    #[test]
    fn test_xml_sink_encodes_unusable_column_names() {
        let schema = TableSchema::new(["id", "first name", "2024"]);
        let mut out = Vec::new();
        let mut sink = Box::new(XmlTableSink::new(&mut out, &schema).unwrap());
        sink.write_row(&TableRow::from_texts(["1", "Ann", "x"]))
            .unwrap();
        sink.finalize().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#"<col name="first name"/>"#));
        assert!(text.contains(r#"<row id="1" first_x0020_name="Ann" _x0032_024="x"/>"#));

        let mut source = XmlTableSource::new(Cursor::new(text)).unwrap();
        let data = read_all(&mut source).unwrap();
        assert_eq!(data.schema, schema);
        assert_eq!(data.rows, vec![TableRow::from_texts(["1", "Ann", "x"])]);
    }
}
