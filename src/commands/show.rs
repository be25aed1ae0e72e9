//! Show and plan command handlers.

use std::io::Write;
use std::path::PathBuf;

use tablift::config::TabliftConfig;
use tablift::{Document, Error, Migration, Result};

/// Prints a file as plain text.
pub fn cmd_show(config: &TabliftConfig, file: PathBuf, delimiter: Option<String>) -> Result<()> {
    let document = Document::open(file)?;
    let delimiter = delimiter.unwrap_or_else(|| config.import.delimiter.clone());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    document.render(&mut out, &delimiter)?;
    out.flush().map_err(|e| Error::FileCreate {
        path: "<stdout>".to_string(),
        cause: e.to_string(),
    })
}

/// Prints the operation a path and table classify as.
pub fn cmd_plan(config: &TabliftConfig, path: PathBuf, table: String) -> Result<()> {
    let migration = Migration::with_config(&path, table, &config.store);

    println!("Source: {}", migration.source().display());
    println!("Table: {}", migration.table());
    println!("Backend: {}", config.store.backend);
    println!("Operation: {}", migration.operation());
    if let Some(e) = migration.error() {
        println!("Reason [{}]: {e}", e.kind());
    }
    Ok(())
}
