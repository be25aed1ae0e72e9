//! Integration tests for tablift.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
use tablift::config::TabliftConfig;
use tablift::observability::LogFormat;
use tablift::{
    Document, Error, ErrorKind, Format, MigrationOperation, RaggedRows, SqliteStore, StoreBackend,
};
use tempfile::TempDir;

#[test]
fn test_error_types() {
    let err = Error::InvalidInput("test message".to_string());
    let display = format!("{err}");
    assert!(display.contains("invalid input"));
    assert!(display.contains("test message"));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = Error::FileExists {
        path: "/tmp/out/people.txt".to_string(),
    };
    assert!(err.to_string().contains("/tmp/out/people.txt"));
    assert_eq!(err.kind().as_str(), "file-exists");

    let err = Error::StoreConnection {
        backend: "postgres".to_string(),
        cause: "connection refused".to_string(),
    };
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(err.kind().to_string(), "store-connection-error");

    let err = Error::FeatureNotEnabled("postgres".to_string());
    assert!(err.to_string().contains("--features postgres"));
}

#[test]
fn test_format_resolution() {
    assert_eq!(Format::from_path("a/people.CSV".as_ref()), Format::Csv);
    assert_eq!(Format::from_path("people.json".as_ref()), Format::Json);
    assert_eq!(Format::from_path("people.xml".as_ref()), Format::Xml);
    assert_eq!(Format::from_path("people.tsv".as_ref()), Format::Txt);
    assert_eq!(Format::from_path("people".as_ref()), Format::Txt);

    assert_eq!(".xml".parse::<Format>().unwrap(), Format::Xml);
    assert_eq!(
        "yaml".parse::<Format>().unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
}

#[test]
fn test_config_file_and_env_layering() {
    let mut config = TabliftConfig::from_toml(
        r#"
        [store]
        backend = "sqlite"
        database = "/var/lib/tablift/main"

        [import]
        delimiter = ";"
        ragged_rows = "pad"

        [export]
        format = "json"

        [logging]
        format = "json"
        level = "info"
        "#,
    )
    .unwrap();

    assert_eq!(config.store.sqlite_path(), PathBuf::from("/var/lib/tablift/main.db"));
    assert_eq!(config.import.ragged_rows, RaggedRows::Pad);
    assert_eq!(config.export.format, Format::Json);
    assert_eq!(config.logging.format, LogFormat::Json);

    config
        .apply_env(|key| match key {
            "TABLIFT_STORE_BACKEND" => Some("postgres".to_string()),
            "TABLIFT_LOG_LEVEL" => Some("debug".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.store.backend, StoreBackend::Postgres);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.import.delimiter, ";");
}

#[test]
fn test_config_rejects_unknown_keys() {
    let err = TabliftConfig::from_toml("[store]\nhostname = \"x\"\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn test_config_load_explicit_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = TabliftConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileRead);
}

#[test]
fn test_document_render_and_migrate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.json");
    std::fs::write(&path, r#"[{"id": 1, "name": "Alice"}, {"id": 22, "name": null}]"#).unwrap();

    let doc = Document::open(&path).unwrap();
    assert_eq!(doc.format(), Format::Json);

    let mut out = Vec::new();
    doc.render(&mut out, ",").unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "id  name\n1   Alice\n22  -\n"
    );

    let migration = doc.migrate("people", Box::new(SqliteStore::in_memory().unwrap()));
    assert_eq!(migration.operation(), MigrationOperation::Import);
}

#[test]
fn test_document_open_errors() {
    let dir = TempDir::new().unwrap();

    let err = Document::open(dir.path().join("missing.csv")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongPath);

    let err = Document::open(dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let image = dir.path().join("photo.png");
    std::fs::write(&image, b"\x89PNG").unwrap();
    let err = Document::open(image).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_txt_document_renders_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "a|b\r\n1|2\n").unwrap();

    let mut out = Vec::new();
    Document::open(&path).unwrap().render(&mut out, "|").unwrap();
    assert_eq!(out, b"a|b\r\n1|2\n");
}
