//! Config command handler.
//!
//! Prints the effective configuration after file, environment and flag
//! overrides. The store password is never printed.

use std::path::PathBuf;

use tablift::Result;
use tablift::config::{StoreBackend, TabliftConfig};

/// Config command.
///
/// `source` is the file named by `--config` or `TABLIFT_CONFIG_PATH`.
pub fn cmd_config(config: &TabliftConfig, source: Option<PathBuf>) -> Result<()> {
    println!("Current Configuration");
    println!("=====================");
    println!();

    println!("Config File:");
    match source.or_else(TabliftConfig::default_path) {
        Some(path) if path.exists() => println!("  {}", path.display()),
        Some(path) => println!("  (none - {} not found)", path.display()),
        None => println!("  (none - no config directory)"),
    }
    println!();

    let store = &config.store;
    println!("Store:");
    println!("  Backend: {}", store.backend);
    match store.backend {
        StoreBackend::Sqlite => {
            println!("  Database File: {}", store.sqlite_path().display());
        },
        StoreBackend::Postgres => {
            println!("  Host: {}", store.host);
            println!("  Port: {}", store.port.map_or_else(|| "(default)".to_string(), |p| p.to_string()));
            println!(
                "  Socket: {}",
                store
                    .socket
                    .as_ref()
                    .map_or_else(|| "(none)".to_string(), |s| s.display().to_string())
            );
            println!("  User: {}", store.user);
            println!(
                "  Password: {}",
                if store.password.is_some() { "(set)" } else { "(none)" }
            );
            println!("  Database: {}", store.database);
        },
    }
    println!();

    println!("Import:");
    println!("  Delimiter: {:?}", config.import.delimiter);
    println!("  Ragged Rows: {}", config.import.ragged_rows);
    println!("  Batch Rows: {}", config.import.batch_rows);
    println!();

    println!("Export:");
    println!("  Format: {}", config.export.format);
    println!("  Delimiter: {:?}", config.export.delimiter);
    println!();

    println!("Logging:");
    println!("  Format: {}", config.logging.format);
    println!("  Level: {}", config.logging.level);
    println!(
        "  File: {}",
        config
            .logging
            .file
            .as_ref()
            .map_or_else(|| "(stderr)".to_string(), |f| f.display().to_string())
    );

    Ok(())
}
