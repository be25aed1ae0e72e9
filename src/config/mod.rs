//! Configuration management.
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file, `TABLIFT_*` environment variables, then command-line flags applied
//! by the binary. Nothing is global; the resulting [`StoreConfig`] is passed
//! to each migration explicitly.

use crate::io::Format;
use crate::models::RaggedRows;
use crate::observability::{LogFormat, LoggingConfig};
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TABLIFT_CONFIG_PATH";

/// Main configuration for tablift.
#[derive(Debug, Clone, Default)]
pub struct TabliftConfig {
    /// Table store connection.
    pub store: StoreConfig,
    /// Import defaults.
    pub import: ImportConfig,
    /// Export defaults.
    pub export: ExportConfig,
    /// Logging setup.
    pub logging: LoggingConfig,
}

/// Which table store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreBackend {
    /// `SQLite` database file.
    #[default]
    Sqlite,
    /// PostgreSQL server (requires the `postgres` feature).
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(Error::InvalidInput(format!(
                "unknown store backend: {s} (expected sqlite or postgres)"
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

/// Table store connection parameters.
///
/// Each field is defaulted on its own, so a caller can override just the
/// database and keep everything else.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend kind.
    pub backend: StoreBackend,
    /// Server host (postgres).
    pub host: String,
    /// User name (postgres).
    pub user: String,
    /// Password (postgres). Never logged.
    pub password: Option<SecretString>,
    /// Database name; for `SQLite` the database file path.
    pub database: String,
    /// Server port (postgres, default 5432).
    pub port: Option<u16>,
    /// Unix socket directory (postgres), used instead of `host` when set.
    pub socket: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            host: "localhost".to_string(),
            user: "root".to_string(),
            password: None,
            database: "tablift".to_string(),
            port: None,
            socket: None,
        }
    }
}

impl StoreConfig {
    /// Returns a `SQLite` config for the given database file.
    #[must_use]
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self {
            database: path.as_ref().display().to_string(),
            ..Self::default()
        }
    }

    /// Path of the `SQLite` database file.
    ///
    /// A name without an extension gets `.db`; `:memory:` is kept as is.
    #[must_use]
    pub fn sqlite_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.database);
        if self.database == ":memory:" || path.extension().is_some() {
            path
        } else {
            path.with_extension("db")
        }
    }
}

/// Import defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Delimiter for CSV and delimited text sources.
    pub delimiter: String,
    /// Handling of rows whose width differs from the header.
    pub ragged_rows: RaggedRows,
    /// Maximum rows per `INSERT` statement.
    pub batch_rows: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            ragged_rows: RaggedRows::Reject,
            batch_rows: 500,
        }
    }
}

/// Export defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Output format.
    pub format: Format,
    /// Delimiter for CSV and delimited text output.
    pub delimiter: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: Format::Txt,
            delimiter: ",".to_string(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Store section.
    pub store: Option<ConfigFileStore>,
    /// Import section.
    pub import: Option<ConfigFileImport>,
    /// Export section.
    pub export: Option<ConfigFileExport>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// `[store]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileStore {
    /// Backend name.
    pub backend: Option<String>,
    /// Host.
    pub host: Option<String>,
    /// User.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Database.
    pub database: Option<String>,
    /// Port.
    pub port: Option<u16>,
    /// Socket directory.
    pub socket: Option<String>,
}

/// `[import]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileImport {
    /// Delimiter.
    pub delimiter: Option<String>,
    /// Ragged row policy.
    pub ragged_rows: Option<RaggedRows>,
    /// Rows per insert.
    pub batch_rows: Option<usize>,
}

/// `[export]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileExport {
    /// Output format.
    pub format: Option<String>,
    /// Delimiter.
    pub delimiter: Option<String>,
}

/// `[logging]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Level filter.
    pub level: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl TabliftConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] for invalid TOML, unknown keys or an
    /// unknown `ragged_rows` policy, and [`Error::InvalidInput`] for other
    /// unknown enum values.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::malformed("config", e.to_string()))?;
        Self::from_config_file(file)
    }

    /// Returns the platform config file path (`<config_dir>/tablift/config.toml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("tablift").join("config.toml"))
    }

    /// Loads configuration with file discovery and environment overrides.
    ///
    /// The file is `explicit` if given, else `$TABLIFT_CONFIG_PATH`, else the
    /// platform default when it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file is missing or any source is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match named {
            Some(path) => Self::load_from_file(&path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `TABLIFT_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unparsable values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(backend) = lookup("TABLIFT_STORE_BACKEND") {
            self.store.backend = backend.parse()?;
        }
        if let Some(host) = lookup("TABLIFT_STORE_HOST") {
            self.store.host = host;
        }
        if let Some(user) = lookup("TABLIFT_STORE_USER") {
            self.store.user = user;
        }
        if let Some(password) = lookup("TABLIFT_STORE_PASSWORD") {
            self.store.password = Some(SecretString::from(password));
        }
        if let Some(database) = lookup("TABLIFT_STORE_DATABASE") {
            self.store.database = database;
        }
        if let Some(port) = lookup("TABLIFT_STORE_PORT") {
            self.store.port = Some(parse_port(&port)?);
        }
        if let Some(socket) = lookup("TABLIFT_STORE_SOCKET") {
            self.store.socket = Some(PathBuf::from(socket));
        }
        if let Some(format) = lookup("TABLIFT_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        if let Some(level) = lookup("TABLIFT_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Converts a `ConfigFile` to `TabliftConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(store) = file.store {
            if let Some(backend) = store.backend {
                config.store.backend = backend.parse()?;
            }
            if let Some(host) = store.host {
                config.store.host = host;
            }
            if let Some(user) = store.user {
                config.store.user = user;
            }
            config.store.password = store.password.map(SecretString::from);
            if let Some(database) = store.database {
                config.store.database = database;
            }
            config.store.port = store.port;
            config.store.socket = store.socket.map(PathBuf::from);
        }

        if let Some(import) = file.import {
            if let Some(delimiter) = import.delimiter {
                config.import.delimiter = delimiter;
            }
            if let Some(policy) = import.ragged_rows {
                config.import.ragged_rows = policy;
            }
            if let Some(batch_rows) = import.batch_rows {
                if batch_rows == 0 {
                    return Err(Error::InvalidInput(
                        "import.batch_rows must be at least 1".to_string(),
                    ));
                }
                config.import.batch_rows = batch_rows;
            }
        }

        if let Some(export) = file.export {
            if let Some(format) = export.format {
                config.export.format = format.parse()?;
            }
            if let Some(delimiter) = export.delimiter {
                config.export.delimiter = delimiter;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = format.parse::<LogFormat>()?;
            }
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }

        Ok(config)
    }
}

fn parse_port(value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid port: {value}")))
}
