//! Migration services.
//!
//! [`Migration`] orchestrates the file readers and writers in [`crate::io`]
//! and a [`crate::storage::TableStore`]. [`schema`] derives table
//! definitions from file headers.

mod migration;
pub mod schema;

pub use migration::{ExportRequest, ImportOptions, ImportReport, Migration};
pub use schema::{ColumnDefinition, ColumnType, TableDefinition, infer_definition};
