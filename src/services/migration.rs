//! Migration controller.
//!
//! A [`Migration`] classifies its source path and table once, at
//! construction, then performs at most one import or one export. Both
//! operations consume the controller.
//!
//! | Source | Table | Operation |
//! |--------|-------|-----------|
//! | missing | any | invalid (`wrong-path`) |
//! | file | missing | import |
//! | file | present | invalid (`everything-exists`) |
//! | directory | present | export |
//! | directory | missing | invalid (`no-file-and-no-table`) |

use crate::config::{ExportConfig, ImportConfig, StoreConfig};
use crate::io::{Document, Format, read_table, write_table};
use crate::models::{Classification, MigrationOperation, RaggedRows, SourceKind, classify};
use crate::services::schema::infer_definition;
use crate::storage::sql::{build_create_table, build_insert_batches};
use crate::storage::{TableStore, open_store};
use crate::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Options for an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Delimiter for CSV and delimited text sources.
    pub delimiter: String,
    /// Handling of rows whose width differs from the header.
    pub ragged_rows: RaggedRows,
    /// Maximum rows per `INSERT` statement.
    pub batch_rows: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            ragged_rows: RaggedRows::Reject,
            batch_rows: 500,
        }
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            delimiter: config.delimiter.clone(),
            ragged_rows: config.ragged_rows,
            batch_rows: config.batch_rows,
        }
    }
}

impl ImportOptions {
    /// Sets the delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets the ragged row policy.
    #[must_use]
    pub const fn with_ragged_rows(mut self, policy: RaggedRows) -> Self {
        self.ragged_rows = policy;
        self
    }

    /// Sets the maximum rows per insert statement.
    #[must_use]
    pub const fn with_batch_rows(mut self, batch_rows: usize) -> Self {
        self.batch_rows = batch_rows;
        self
    }
}

/// Result of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Table that was created.
    pub table: String,
    /// Format the source was read as.
    pub format: Format,
    /// Number of columns created.
    pub columns: usize,
    /// Number of rows inserted.
    pub rows: usize,
    /// Statements executed in the transaction.
    pub statements: usize,
}

/// Parameters of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// File name without extension; defaults to the table name.
    pub filename: Option<String>,
    /// Output format; its extension is appended to the file name.
    pub format: Format,
    /// Delimiter for CSV and delimited text output.
    pub delimiter: String,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            filename: None,
            format: Format::Txt,
            delimiter: ",".to_string(),
        }
    }
}

impl From<&ExportConfig> for ExportRequest {
    fn from(config: &ExportConfig) -> Self {
        Self {
            filename: None,
            format: config.format,
            delimiter: config.delimiter.clone(),
        }
    }
}

impl ExportRequest {
    /// Sets the file name (without extension).
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Sets the delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }
}

/// Outcome of classification.
#[derive(Debug)]
enum State {
    Ready(MigrationOperation),
    Invalid(Error),
}

/// One import or export between a file and a table.
pub struct Migration {
    source: PathBuf,
    table: String,
    store: Option<Box<dyn TableStore>>,
    state: State,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("source", &self.source)
            .field("table", &self.table)
            .field("store", &self.store.as_ref().map(|s| s.backend_name()))
            .field("state", &self.state)
            .finish()
    }
}

impl Migration {
    /// Classifies a migration against an already connected store.
    pub fn new(source: impl AsRef<Path>, table: impl Into<String>, store: Box<dyn TableStore>) -> Self {
        let source = source.as_ref().to_path_buf();
        let table = table.into();
        let kind = SourceKind::probe(&source);
        let state = Self::classify_with(&source, &table, kind, store.as_ref());
        Self::log_classification(&source, &table, &state);
        Self {
            source,
            table,
            store: Some(store),
            state,
        }
    }

    /// Classifies a migration, connecting to the store described by `config`.
    ///
    /// A missing source path is reported as `wrong-path` without connecting.
    /// A failed connection leaves the migration invalid with
    /// `store-connection-error`.
    pub fn with_config(source: impl AsRef<Path>, table: impl Into<String>, config: &StoreConfig) -> Self {
        let source = source.as_ref().to_path_buf();
        let table = table.into();
        let kind = SourceKind::probe(&source);

        let (store, state) = if kind == SourceKind::Missing {
            (None, State::Invalid(wrong_path(&source)))
        } else {
            match open_store(config) {
                Ok(store) => {
                    let state = Self::classify_with(&source, &table, kind, store.as_ref());
                    (Some(store), state)
                },
                Err(e) => (None, State::Invalid(e)),
            }
        };
        Self::log_classification(&source, &table, &state);
        Self {
            source,
            table,
            store,
            state,
        }
    }

    fn classify_with(source: &Path, table: &str, kind: SourceKind, store: &dyn TableStore) -> State {
        let table_exists = if kind == SourceKind::Missing {
            false
        } else {
            match store.table_exists(table) {
                Ok(exists) => exists,
                Err(e) => return State::Invalid(e),
            }
        };

        match classify(kind, table_exists) {
            Classification::Permitted(operation) => State::Ready(operation),
            Classification::WrongPath => State::Invalid(wrong_path(source)),
            Classification::NoFileAndNoTable => State::Invalid(Error::NoFileAndNoTable {
                path: source.display().to_string(),
                table: table.to_string(),
            }),
            Classification::EverythingExists => State::Invalid(Error::EverythingExists {
                path: source.display().to_string(),
                table: table.to_string(),
            }),
        }
    }

    fn log_classification(source: &Path, table: &str, state: &State) {
        match state {
            State::Ready(operation) => tracing::info!(
                source = %source.display(),
                table,
                operation = %operation,
                "Classified migration"
            ),
            State::Invalid(e) => tracing::warn!(
                source = %source.display(),
                table,
                kind = %e.kind(),
                error = %e,
                "Migration is invalid"
            ),
        }
    }

    /// Returns the classified operation.
    #[must_use]
    pub const fn operation(&self) -> MigrationOperation {
        match self.state {
            State::Ready(operation) => operation,
            State::Invalid(_) => MigrationOperation::Invalid,
        }
    }

    /// Returns the error that made this migration invalid.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        match &self.state {
            State::Ready(_) => None,
            State::Invalid(e) => Some(e),
        }
    }

    /// Returns the source path.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Checks the state for `wanted` and hands back the store.
    fn take_store(&mut self, wanted: MigrationOperation) -> Result<Box<dyn TableStore>> {
        let refused = |operation: String| match wanted {
            MigrationOperation::Import => Error::ImportImpossible { operation },
            _ => Error::ExportImpossible { operation },
        };
        match &self.state {
            State::Invalid(e) if e.kind() == ErrorKind::StoreConnection => Err(e.clone()),
            State::Invalid(e) => Err(refused(format!("invalid: {}", e.kind()))),
            State::Ready(operation) if *operation != wanted => Err(refused(operation.to_string())),
            State::Ready(_) => self.store.take().ok_or_else(|| Error::StoreConnection {
                backend: "unknown".to_string(),
                cause: "no store attached".to_string(),
            }),
        }
    }

    /// Imports the source file into a new table.
    ///
    /// Runs `CREATE TABLE` and every `INSERT` in one transaction, so a
    /// failure leaves no table behind.
    ///
    /// # Errors
    ///
    /// - `import-impossible` unless classified as import
    /// - `store-connection-error` if the store could not be reached
    /// - `file-read-error` / `malformed-input` if the source cannot be parsed
    /// - `store-query-error` if the transaction fails
    pub fn import(mut self, options: &ImportOptions) -> Result<ImportReport> {
        let mut store = self.take_store(MigrationOperation::Import)?;
        let start = Instant::now();
        let format = Format::from_path(&self.source);

        let mut data = read_table(&self.source, format, &options.delimiter)?;
        tracing::debug!(
            format = %format,
            columns = data.schema.len(),
            rows = data.rows.len(),
            "Read source file"
        );

        let definition = infer_definition(&self.table, &data.schema)?;
        data.conform(options.ragged_rows)?;

        let dialect = store.dialect();
        let mut statements = vec![build_create_table(dialect, &definition)];
        statements.extend(build_insert_batches(
            dialect,
            &definition,
            &data.rows,
            options.batch_rows,
        )?);
        store.execute_in_transaction(&statements)?;

        record_rows("import", format, data.rows.len());
        tracing::info!(
            table = %self.table,
            rows = data.rows.len(),
            statements = statements.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Import complete"
        );

        Ok(ImportReport {
            table: self.table,
            format,
            columns: definition.columns.len(),
            rows: data.rows.len(),
            statements: statements.len(),
        })
    }

    /// Exports the table into a new file in the source directory.
    ///
    /// The file is `<directory>/<filename or table>.<extension>`.
    ///
    /// # Errors
    ///
    /// - `export-impossible` unless classified as export
    /// - `invalid-input` if the file name contains a path separator
    /// - `file-exists` if the destination is already present
    /// - `file-create-error` if the destination cannot be written
    pub fn export(mut self, request: &ExportRequest) -> Result<Document> {
        let store = self.take_store(MigrationOperation::Export)?;
        let start = Instant::now();

        let filename = request.filename.as_deref().unwrap_or(&self.table);
        let destination = destination_path(&self.source, filename, request.format)?;
        if destination.exists() {
            return Err(Error::FileExists {
                path: destination.display().to_string(),
            });
        }

        let data = store.read_table(&self.table)?;
        tracing::debug!(
            columns = data.schema.len(),
            rows = data.rows.len(),
            "Read table"
        );
        let rows = write_table(&destination, &data, request.format, &request.delimiter)?;

        record_rows("export", request.format, rows);
        tracing::info!(
            table = %self.table,
            destination = %destination.display(),
            rows,
            elapsed_ms = start.elapsed().as_millis(),
            "Export complete"
        );

        Document::open(destination)
    }
}

fn wrong_path(source: &Path) -> Error {
    Error::WrongPath {
        path: source.display().to_string(),
    }
}

/// Builds `<directory>/<filename>.<extension>`, refusing names that would
/// escape the directory.
fn destination_path(directory: &Path, filename: &str, format: Format) -> Result<PathBuf> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
        || filename.contains('\0');
    if invalid {
        return Err(Error::InvalidInput(format!(
            "export file name {filename:?} must be a plain file name"
        )));
    }
    Ok(directory.join(format!("{filename}.{}", format.extension())))
}

#[allow(clippy::cast_possible_truncation)]
fn record_rows(direction: &'static str, format: Format, rows: usize) {
    metrics::counter!(
        "migration_rows_total",
        "direction" => direction,
        "format" => format.extension()
    )
    .increment(rows as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use crate::storage::sql::Statement;

    fn store_with_people() -> Box<dyn TableStore> {
        let store = SqliteStore::in_memory().unwrap();
        store
            .execute(&Statement::new(
                r#"CREATE TABLE "people" ("id" INTEGER PRIMARY KEY, "name" TEXT)"#,
            ))
            .unwrap();
        store
            .execute(&Statement::new(
                r#"INSERT INTO "people" VALUES (1, 'Alice'), (2, 'Bob')"#,
            ))
            .unwrap();
        Box::new(store)
    }

    #[test]
    fn test_import_csv_example() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("people.csv");
        std::fs::write(&source, "id,name\n1,Alice\n2,Bob\n").unwrap();

        let migration = Migration::new(&source, "people", Box::new(SqliteStore::in_memory().unwrap()));
        assert_eq!(migration.operation(), MigrationOperation::Import);
        assert!(migration.error().is_none());

        let report = migration.import(&ImportOptions::default()).unwrap();
        assert_eq!(report.format, Format::Csv);
        assert_eq!(report.columns, 2);
        assert_eq!(report.rows, 2);
        assert_eq!(report.statements, 2);
    }

    #[test]
    fn test_import_refused_on_export_migration() {
        let dir = tempfile::tempdir().unwrap();
        let migration = Migration::new(dir.path(), "people", store_with_people());
        assert_eq!(migration.operation(), MigrationOperation::Export);

        let err = migration.import(&ImportOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImportImpossible);
    }

    #[test]
    fn test_export_refused_on_invalid_migration() {
        let dir = tempfile::tempdir().unwrap();
        let migration = Migration::new(dir.path(), "orders", store_with_people());
        assert_eq!(migration.operation(), MigrationOperation::Invalid);
        assert_eq!(
            migration.error().map(Error::kind),
            Some(ErrorKind::NoFileAndNoTable)
        );

        let err = migration.export(&ExportRequest::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExportImpossible);
        assert!(err.to_string().contains("no-file-and-no-table"));
    }

    #[test]
    fn test_export_defaults_to_table_name_txt() {
        let dir = tempfile::tempdir().unwrap();
        let migration = Migration::new(dir.path(), "people", store_with_people());
        let doc = migration.export(&ExportRequest::default()).unwrap();

        assert_eq!(doc.path(), dir.path().join("people.txt"));
        assert_eq!(
            std::fs::read_to_string(doc.path()).unwrap(),
            "id,name\n1,Alice\n2,Bob\n"
        );
    }

    #[test]
    fn test_export_rejects_path_in_filename() {
        let dir = tempfile::tempdir().unwrap();
        let migration = Migration::new(dir.path(), "people", store_with_people());
        let request = ExportRequest::default().with_filename("../escape");
        let err = migration.export(&request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_with_config_wrong_path_skips_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::sqlite(dir.path().join("no-such-dir").join("db.sqlite"));
        let migration = Migration::with_config(dir.path().join("missing.csv"), "t", &config);
        assert_eq!(
            migration.error().map(Error::kind),
            Some(ErrorKind::WrongPath)
        );
    }

    #[test]
    fn test_with_config_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.csv");
        std::fs::write(&source, "a\n1\n").unwrap();
        let config = StoreConfig::sqlite(dir.path().join("no-such-dir").join("db.sqlite"));

        let migration = Migration::with_config(&source, "a", &config);
        assert_eq!(migration.operation(), MigrationOperation::Invalid);
        let err = migration.import(&ImportOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreConnection);
    }

    #[test]
    fn test_destination_path() {
        let dir = Path::new("/data");
        assert_eq!(
            destination_path(dir, "people", Format::Json).unwrap(),
            PathBuf::from("/data/people.json")
        );
        assert!(destination_path(dir, "", Format::Json).is_err());
        assert!(destination_path(dir, "a/b", Format::Json).is_err());
    }
}
