use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::cli::{ServeArgs, StoreArgs};
use crate::clock::Clock;
use crate::platform;
use crate::store::sqlite::SqliteRepository;
use crate::store::{Retention, DEFAULT_RETENTION};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid retention '{value}': {source}")]
    Retention {
        value: String,
        source: humantime::DurationError,
    },

    #[error("invalid listen address '{value}': {source}")]
    Listen {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Database(#[from] crate::Error),
}

/// On-disk config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<String>,
    pub listen: Option<String>,
    pub retention: Option<String>,
    pub max_body_bytes: Option<usize>,
    pub sql_logging: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    fn parse(value: &str) -> Self {
        if value == IN_MEMORY {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(PathBuf::from(value))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseLocation,
    pub listen: SocketAddr,
    pub retention: Retention,
    pub max_body_bytes: usize,
    pub sql_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseLocation::File(platform::default_database_path()),
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            retention: Retention::Window(DEFAULT_RETENTION),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            sql_logging: false,
        }
    }
}

impl Config {
    /// Defaults, then the config file, then command-line flags.
    pub fn load(args: &StoreArgs) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let explicit = args.config.is_some();
        let path = args.config.clone().or_else(platform::default_config_path);
        if let Some(path) = path {
            if explicit || path.exists() {
                config.apply_file(read_file(&path)?)?;
            }
        }

        config.apply_store_args(args)?;
        Ok(config)
    }

    pub fn from_serve_args(args: &ServeArgs) -> Result<Self, ConfigError> {
        let mut config = Config::load(&args.store)?;
        if let Some(listen) = &args.listen {
            config.listen = parse_listen(listen)?;
        }
        if let Some(max_body_bytes) = args.max_body_bytes {
            config.max_body_bytes = max_body_bytes;
        }
        Ok(config)
    }

    pub fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(database) = &file.database {
            self.database = DatabaseLocation::parse(database);
        }
        if let Some(listen) = &file.listen {
            self.listen = parse_listen(listen)?;
        }
        if let Some(retention) = &file.retention {
            self.retention = parse_retention(retention)?;
        }
        if let Some(max_body_bytes) = file.max_body_bytes {
            self.max_body_bytes = max_body_bytes;
        }
        if let Some(sql_logging) = file.sql_logging {
            self.sql_logging = sql_logging;
        }
        Ok(())
    }

    fn apply_store_args(&mut self, args: &StoreArgs) -> Result<(), ConfigError> {
        if let Some(database) = &args.database {
            self.database = DatabaseLocation::parse(database);
        }
        if let Some(retention) = &args.retention {
            self.retention = parse_retention(retention)?;
        }
        if args.sql_logging {
            self.sql_logging = true;
        }
        Ok(())
    }

    /// Open the configured SQLite store, creating its directory if needed.
    pub fn open_repository(&self, clock: Arc<dyn Clock>) -> Result<SqliteRepository, ConfigError> {
        let mut repository = match &self.database {
            DatabaseLocation::Memory => SqliteRepository::open_in_memory(clock, self.retention)?,
            DatabaseLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                SqliteRepository::open(path, clock, self.retention)?
            }
        };

        if self.sql_logging {
            repository.enable_sql_logging();
        }
        Ok(repository)
    }
}

pub fn parse_file(path: &Path, text: &str) -> Result<FileConfig, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_file(path, &text)
}

/// "never" (or "forever") disables the sweep; anything else is a humantime
/// duration such as "14d" or "2w 3d".
pub fn parse_retention(value: &str) -> Result<Retention, ConfigError> {
    match value.trim() {
        "never" | "forever" => Ok(Retention::Forever),
        other => humantime::parse_duration(other)
            .map(Retention::Window)
            .map_err(|source| ConfigError::Retention {
                value: value.to_string(),
                source,
            }),
    }
}

fn parse_listen(value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|source| ConfigError::Listen {
        value: value.to_string(),
        source,
    })
}
