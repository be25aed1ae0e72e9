//! Tabular file I/O.
//!
//! # Architecture
//!
//! - **Format adapters** implement [`TableSource`] and [`TableSink`]
//! - [`Format`] is resolved once from a file extension and matched explicitly
//! - [`Document`] wraps a file on disk for display and as the export result
//!
//! # Supported Formats
//!
//! | Format | Extension | Notes |
//! |--------|-----------|-------|
//! | CSV | `.csv` | Quote-aware, single-byte delimiter |
//! | TXT | anything else | Raw delimiter split, no quoting |
//! | JSON | `.json` | Array of flat objects |
//! | XML | `.xml` | `<columns>`/`<rows>` dialect |
//!
//! # Examples
//!
//! ```rust,ignore
//! use tablift::io::{Format, read_table};
//! use std::path::Path;
//!
//! let path = Path::new("people.csv");
//! let data = read_table(path, Format::from_path(path), ",")?;
//! println!("{} columns, {} rows", data.schema.len(), data.rows.len());
//! ```

mod document;
pub mod formats;
pub mod traits;

pub use document::Document;
pub use formats::{
    Format, create_table_sink, create_table_source, read_table, write_table,
};
pub use traits::{TableSink, TableSource, read_all, write_all};
