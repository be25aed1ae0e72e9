//! Data models for tablift.
//!
//! Tables in transit and the migration classification.

mod operation;
mod table;

pub use operation::{Classification, MigrationOperation, SourceKind, classify};
pub use table::{Cell, RaggedRows, TableData, TableRow, TableSchema};
