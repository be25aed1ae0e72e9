//! Migration classification integration tests.
//!
//! Covers the five path/table combinations against an on-disk `SQLite`
//! store, and the refusal of the wrong operation.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use tablift::storage::Statement;
use tablift::{
    ErrorKind, ExportRequest, ImportOptions, Migration, MigrationOperation, SqliteStore, StoreConfig,
    TableStore,
};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

/// Opens the scratch database, creating `people` when asked.
fn open_store(dir: &TempDir, with_people: bool) -> Box<dyn TableStore> {
    let store = SqliteStore::new(dir.path().join("store.db")).expect("open store");
    if with_people {
        store
            .execute(&Statement::new(
                r#"CREATE TABLE IF NOT EXISTS "people" ("id" INTEGER PRIMARY KEY, "name" TEXT)"#,
            ))
            .unwrap();
    }
    Box::new(store)
}

fn write_source(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "id,name\n1,Alice\n").unwrap();
    path
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_missing_path_is_wrong_path() {
    let dir = TempDir::new().unwrap();
    let migration = Migration::new(dir.path().join("nope.csv"), "people", open_store(&dir, true));

    assert_eq!(migration.operation(), MigrationOperation::Invalid);
    assert_eq!(migration.error().unwrap().kind(), ErrorKind::WrongPath);
}

#[test]
fn test_file_without_table_is_import() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "people.csv");
    let migration = Migration::new(&source, "people", open_store(&dir, false));

    assert_eq!(migration.operation(), MigrationOperation::Import);
    assert!(migration.error().is_none());
}

#[test]
fn test_file_with_table_is_everything_exists() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "people.csv");
    let migration = Migration::new(&source, "people", open_store(&dir, true));

    assert_eq!(migration.operation(), MigrationOperation::Invalid);
    assert_eq!(
        migration.error().unwrap().kind(),
        ErrorKind::EverythingExists
    );
}

#[test]
fn test_table_lookup_ignores_case() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "people.csv");
    let migration = Migration::new(&source, "PEOPLE", open_store(&dir, true));

    assert_eq!(
        migration.error().unwrap().kind(),
        ErrorKind::EverythingExists
    );
}

#[test]
fn test_directory_without_table_is_no_file_and_no_table() {
    let dir = TempDir::new().unwrap();
    let migration = Migration::new(dir.path(), "people", open_store(&dir, false));

    assert_eq!(migration.operation(), MigrationOperation::Invalid);
    assert_eq!(
        migration.error().unwrap().kind(),
        ErrorKind::NoFileAndNoTable
    );
}

#[test]
fn test_directory_with_table_is_export() {
    let dir = TempDir::new().unwrap();
    let migration = Migration::new(dir.path(), "people", open_store(&dir, true));

    assert_eq!(migration.operation(), MigrationOperation::Export);
    assert_eq!(migration.source(), dir.path());
    assert_eq!(migration.table(), "people");
}

// ============================================================================
// Refusals
// ============================================================================

#[test]
fn test_import_refused_on_export() {
    let dir = TempDir::new().unwrap();
    let migration = Migration::new(dir.path(), "people", open_store(&dir, true));

    let err = migration.import(&ImportOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImportImpossible);
}

#[test]
fn test_export_refused_on_import() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "people.csv");
    let migration = Migration::new(&source, "people", open_store(&dir, false));

    let err = migration.export(&ExportRequest::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExportImpossible);
}

#[test]
fn test_invalid_migration_refuses_both() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "people.csv");

    let import = Migration::new(&source, "people", open_store(&dir, true));
    assert_eq!(
        import.import(&ImportOptions::default()).unwrap_err().kind(),
        ErrorKind::ImportImpossible
    );

    let export = Migration::new(&source, "people", open_store(&dir, true));
    assert_eq!(
        export.export(&ExportRequest::default()).unwrap_err().kind(),
        ErrorKind::ExportImpossible
    );
}

// ============================================================================
// Store configuration
// ============================================================================

#[test]
fn test_with_config_classifies_against_configured_store() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "people.csv");
    let config = StoreConfig::sqlite(dir.path().join("configured.db"));

    let migration = Migration::with_config(&source, "people", &config);
    assert_eq!(migration.operation(), MigrationOperation::Import);
    let report = migration.import(&ImportOptions::default()).unwrap();
    assert_eq!(report.rows, 1);

    let again = Migration::with_config(&source, "people", &config);
    assert_eq!(again.error().unwrap().kind(), ErrorKind::EverythingExists);
}

#[test]
fn test_unreachable_store_is_connection_error() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::sqlite(dir.path().join("missing").join("store.db"));

    let migration = Migration::with_config(dir.path(), "people", &config);
    assert_eq!(
        migration.error().unwrap().kind(),
        ErrorKind::StoreConnection
    );
    let err = migration.export(&ExportRequest::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreConnection);
}
