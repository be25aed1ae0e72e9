//! # Tablift
//!
//! Moves tabular data between flat files and relational tables.
//!
//! A [`Migration`] is built from a source path and a table name. It inspects
//! the filesystem and the table store once, then either imports the file
//! (CSV, delimited text, JSON or the `<table>` XML dialect) into a new table,
//! or exports an existing table into a directory in any of those formats.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tablift::{Migration, ImportOptions, StoreConfig};
//!
//! let migration = Migration::with_config("people.csv", "people", &StoreConfig::default());
//! let report = migration.import(&ImportOptions::default())?;
//! println!("{} rows imported", report.rows);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{StoreBackend, StoreConfig, TabliftConfig};
pub use io::{Document, Format};
pub use models::{Cell, MigrationOperation, RaggedRows, SourceKind, TableData, TableRow, TableSchema};
pub use services::{ExportRequest, ImportOptions, ImportReport, Migration};
pub use storage::{SqliteStore, TableStore};

/// Error type for tablift operations.
///
/// # Error Variant Triggers
///
/// | Variant | Kind | Raised When |
/// |---------|------|-------------|
/// | `WrongPath` | `wrong-path` | Source path does not exist |
/// | `NoFileAndNoTable` | `no-file-and-no-table` | Source is a directory and the table is missing |
/// | `EverythingExists` | `everything-exists` | Source is a file and the table already exists |
/// | `ImportImpossible` | `import-impossible` | `import` called on an export migration |
/// | `ExportImpossible` | `export-impossible` | `export` called on an import migration |
/// | `FileExists` | `file-exists` | Export destination already present |
/// | `FileRead` | `file-read-error` | Source file cannot be opened or read |
/// | `FileCreate` | `file-create-error` | Destination cannot be created or written |
/// | `StoreConnection` | `store-connection-error` | Table store is unreachable |
/// | `StoreQuery` | `store-query-error` | A statement failed after connecting |
/// | `MalformedInput` | `malformed-input` | A reader or schema check rejected the data |
/// | `InvalidInput` | `invalid-input` | Caller passed an unusable argument |
/// | `FeatureNotEnabled` | `feature-not-enabled` | Backend not compiled in |
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The source path does not exist.
    #[error("the path '{path}' does not exist")]
    WrongPath {
        /// The missing path.
        path: String,
    },

    /// Directory source and no table to export.
    #[error("there is no file at '{path}' and no table '{table}'")]
    NoFileAndNoTable {
        /// The directory that was given.
        path: String,
        /// The table that was looked up.
        table: String,
    },

    /// File source and a table that already exists.
    #[error("both the file '{path}' and the table '{table}' exist")]
    EverythingExists {
        /// The source file.
        path: String,
        /// The conflicting table.
        table: String,
    },

    /// Import requested on a migration classified otherwise.
    #[error("import is impossible for this migration ({operation})")]
    ImportImpossible {
        /// The operation the migration was classified as.
        operation: String,
    },

    /// Export requested on a migration classified otherwise.
    #[error("export is impossible for this migration ({operation})")]
    ExportImpossible {
        /// The operation the migration was classified as.
        operation: String,
    },

    /// The export destination already exists.
    #[error("the file '{path}' already exists")]
    FileExists {
        /// The destination path.
        path: String,
    },

    /// The source file could not be read.
    #[error("cannot read '{path}': {cause}")]
    FileRead {
        /// The file being read.
        path: String,
        /// The underlying cause.
        cause: String,
    },

    /// The destination file could not be created or written.
    #[error("cannot create '{path}': {cause}")]
    FileCreate {
        /// The file being written.
        path: String,
        /// The underlying cause.
        cause: String,
    },

    /// The table store could not be reached.
    #[error("cannot connect to the {backend} store: {cause}")]
    StoreConnection {
        /// Backend name.
        backend: String,
        /// The underlying cause.
        cause: String,
    },

    /// A store statement failed.
    #[error("store operation '{operation}' failed: {cause}")]
    StoreQuery {
        /// The store operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The input could not be turned into a table.
    #[error("malformed {format} input: {reason}")]
    MalformedInput {
        /// Format or stage that rejected the input.
        format: String,
        /// What was wrong.
        reason: String,
    },

    /// Invalid argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

/// Stable machine-readable category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `wrong-path`
    WrongPath,
    /// `no-file-and-no-table`
    NoFileAndNoTable,
    /// `everything-exists`
    EverythingExists,
    /// `import-impossible`
    ImportImpossible,
    /// `export-impossible`
    ExportImpossible,
    /// `file-exists`
    FileExists,
    /// `file-read-error`
    FileRead,
    /// `file-create-error`
    FileCreate,
    /// `store-connection-error`
    StoreConnection,
    /// `store-query-error`
    StoreQuery,
    /// `malformed-input`
    MalformedInput,
    /// `invalid-input`
    InvalidInput,
    /// `feature-not-enabled`
    FeatureNotEnabled,
}

impl ErrorKind {
    /// Returns the kebab-case name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WrongPath => "wrong-path",
            Self::NoFileAndNoTable => "no-file-and-no-table",
            Self::EverythingExists => "everything-exists",
            Self::ImportImpossible => "import-impossible",
            Self::ExportImpossible => "export-impossible",
            Self::FileExists => "file-exists",
            Self::FileRead => "file-read-error",
            Self::FileCreate => "file-create-error",
            Self::StoreConnection => "store-connection-error",
            Self::StoreQuery => "store-query-error",
            Self::MalformedInput => "malformed-input",
            Self::InvalidInput => "invalid-input",
            Self::FeatureNotEnabled => "feature-not-enabled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::WrongPath { .. } => ErrorKind::WrongPath,
            Self::NoFileAndNoTable { .. } => ErrorKind::NoFileAndNoTable,
            Self::EverythingExists { .. } => ErrorKind::EverythingExists,
            Self::ImportImpossible { .. } => ErrorKind::ImportImpossible,
            Self::ExportImpossible { .. } => ErrorKind::ExportImpossible,
            Self::FileExists { .. } => ErrorKind::FileExists,
            Self::FileRead { .. } => ErrorKind::FileRead,
            Self::FileCreate { .. } => ErrorKind::FileCreate,
            Self::StoreConnection { .. } => ErrorKind::StoreConnection,
            Self::StoreQuery { .. } => ErrorKind::StoreQuery,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::FeatureNotEnabled(_) => ErrorKind::FeatureNotEnabled,
        }
    }

    pub(crate) fn malformed(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            format: format.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn file_read(path: &std::path::Path, cause: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn file_create(path: &std::path::Path, cause: impl std::fmt::Display) -> Self {
        Self::FileCreate {
            path: path.display().to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for tablift operations.
pub type Result<T> = std::result::Result<T, Error>;
