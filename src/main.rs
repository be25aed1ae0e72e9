//! Binary entry point for tablift.
//!
//! This binary provides the CLI for moving tables between files and a
//! relational store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow unnecessary_wraps for consistent command function signatures
#![allow(clippy::unnecessary_wraps)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tablift::config::TabliftConfig;
use tablift::observability;
use tablift::{Result, StoreBackend};

/// Tablift - move tables between CSV, TXT, JSON, XML files and a database.
#[derive(Parser)]
#[command(name = "tablift")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "TABLIFT_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Store connection overrides.
///
/// The password is only read from configuration or `TABLIFT_STORE_PASSWORD`.
#[derive(clap::Args, Debug, Default)]
struct StoreArgs {
    /// Store backend: sqlite or postgres.
    #[arg(long, global = true)]
    backend: Option<StoreBackend>,

    /// Server host.
    #[arg(long, global = true)]
    host: Option<String>,

    /// User name.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Database name (sqlite: database file).
    #[arg(long, global = true)]
    database: Option<String>,

    /// Server port.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Unix socket directory.
    #[arg(long, global = true)]
    socket: Option<PathBuf>,
}

impl StoreArgs {
    fn apply(self, config: &mut TabliftConfig) {
        let store = &mut config.store;
        if let Some(backend) = self.backend {
            store.backend = backend;
        }
        if let Some(host) = self.host {
            store.host = host;
        }
        if let Some(user) = self.user {
            store.user = user;
        }
        if let Some(database) = self.database {
            store.database = database;
        }
        if self.port.is_some() {
            store.port = self.port;
        }
        if self.socket.is_some() {
            store.socket = self.socket;
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Import a file into a new table.
    Import {
        /// Source file (.csv, .json, .xml; anything else is delimited text).
        file: PathBuf,

        /// Table to create.
        #[arg(short, long)]
        table: String,

        /// Field delimiter for CSV and text files.
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Handling of ragged rows: reject or pad.
        #[arg(long)]
        ragged_rows: Option<String>,
    },

    /// Export a table into a new file in a directory.
    Export {
        /// Destination directory.
        directory: PathBuf,

        /// Table to export.
        #[arg(short, long)]
        table: String,

        /// File name without extension (default: the table name).
        #[arg(short = 'o', long)]
        filename: Option<String>,

        /// Output format: csv, txt, json, or xml.
        #[arg(short, long)]
        format: Option<String>,

        /// Field delimiter for CSV and text files.
        #[arg(short, long)]
        delimiter: Option<String>,
    },

    /// Print a file as plain text.
    Show {
        /// File to show.
        file: PathBuf,

        /// Field delimiter for CSV and text files.
        #[arg(short, long)]
        delimiter: Option<String>,
    },

    /// Show which operation a path and table would run, without running it.
    Plan {
        /// Source file or destination directory.
        path: PathBuf,

        /// Table name.
        #[arg(short, long)]
        table: String,
    },

    /// Show effective configuration.
    Config,
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match TabliftConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let Cli {
        config: config_path,
        store,
        command,
        ..
    } = cli;
    store.apply(&mut config);

    match run_command(command, &config, config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {e}", e.kind());
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(
    command: Commands,
    config: &TabliftConfig,
    config_path: Option<PathBuf>,
) -> Result<()> {
    match command {
        Commands::Import {
            file,
            table,
            delimiter,
            ragged_rows,
        } => commands::cmd_import(config, file, table, delimiter, ragged_rows),

        Commands::Export {
            directory,
            table,
            filename,
            format,
            delimiter,
        } => commands::cmd_export(config, directory, table, filename, format, delimiter),

        Commands::Show { file, delimiter } => commands::cmd_show(config, file, delimiter),

        Commands::Plan { path, table } => commands::cmd_plan(config, path, table),

        Commands::Config => commands::cmd_config(config, config_path),
    }
}
