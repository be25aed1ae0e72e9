//! Import and export command handlers.

use std::path::PathBuf;

use tablift::config::TabliftConfig;
use tablift::{ExportRequest, Format, ImportOptions, Migration, RaggedRows, Result};

/// Executes the import command.
pub fn cmd_import(
    config: &TabliftConfig,
    file: PathBuf,
    table: String,
    delimiter: Option<String>,
    ragged_rows: Option<String>,
) -> Result<()> {
    let mut options = ImportOptions::from(&config.import);
    if let Some(delimiter) = delimiter {
        options = options.with_delimiter(delimiter);
    }
    if let Some(policy) = ragged_rows {
        options = options.with_ragged_rows(policy.parse::<RaggedRows>()?);
    }

    let migration = Migration::with_config(&file, table, &config.store);
    let report = migration.import(&options)?;

    println!("Import completed:");
    println!("  Table: {}", report.table);
    println!("  Format: {}", report.format);
    println!("  Columns: {}", report.columns);
    println!("  Rows: {}", report.rows);
    Ok(())
}

/// Executes the export command.
pub fn cmd_export(
    config: &TabliftConfig,
    directory: PathBuf,
    table: String,
    filename: Option<String>,
    format: Option<String>,
    delimiter: Option<String>,
) -> Result<()> {
    let mut request = ExportRequest::from(&config.export);
    if let Some(filename) = filename {
        request = request.with_filename(filename);
    }
    if let Some(format) = format {
        request = request.with_format(format.parse::<Format>()?);
    }
    if let Some(delimiter) = delimiter {
        request = request.with_delimiter(delimiter);
    }

    let migration = Migration::with_config(&directory, table, &config.store);
    let document = migration.export(&request)?;

    println!("Export completed:");
    println!("  File: {}", document.path().display());
    println!("  Format: {}", document.format());
    Ok(())
}
