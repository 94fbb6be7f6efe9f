//! Configuration types and parsing for warden.yml

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::is_plain_identifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names looked up in the project root, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["warden.yml", "warden.yaml"];

const DEFAULT_DB_PATH: &str = ":memory:";

const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default name of the ledger table.
pub const DEFAULT_LEDGER_TABLE: &str = "dbwarden_migrations";

/// Default name of the lock table.
pub const DEFAULT_LOCK_TABLE: &str = "dbwarden_lock";

/// Default lock acquisition timeout in seconds.
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 300;

/// Project configuration from warden.yml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding migration files, relative to the project root
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Name of the table recording applied migrations
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Name of the single-row lock table
    #[serde(default = "default_lock_table")]
    pub lock_table: String,

    /// Seconds to wait for the migration lock before giving up
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Schema holding the bookkeeping tables; created on connect when set
    #[serde(default)]
    pub schema: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
            schema: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            database: DatabaseConfig::default(),
            ledger_table: default_ledger_table(),
            lock_table: default_lock_table(),
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migrations_dir() -> String {
    DEFAULT_MIGRATIONS_DIR.to_string()
}

fn default_ledger_table() -> String {
    DEFAULT_LEDGER_TABLE.to_string()
}

fn default_lock_table() -> String {
    DEFAULT_LOCK_TABLE.to_string()
}

fn default_lock_timeout_secs() -> u64 {
    DEFAULT_LOCK_TIMEOUT_SECS
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    /// Looks for warden.yml or warden.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Like [`Config::load_from_dir`], but falls back to defaults when the
    /// project has no config file.
    pub fn load_or_default(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => {
                log::debug!(
                    "No config file in {}, using defaults",
                    dir.display()
                );
                Ok(Self::default())
            }
        }
    }

    fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }

        for (field, value) in [
            ("ledger_table", &self.ledger_table),
            ("lock_table", &self.lock_table),
        ] {
            if value.is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{field} cannot be empty"),
                });
            }
            if !is_plain_identifier(value) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "{field} '{value}' must contain only letters, digits and underscores"
                    ),
                });
            }
        }

        if self.ledger_table.eq_ignore_ascii_case(&self.lock_table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "ledger_table and lock_table must differ (both are '{}')",
                    self.ledger_table
                ),
            });
        }

        if let Some(schema) = &self.database.schema {
            if schema.contains('.') || !is_plain_identifier(schema) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("database.schema '{schema}' is not a valid schema name"),
                });
            }
        }

        if self.lock_timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "lock_timeout_secs must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Absolute path of the migrations directory for a project root.
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        let dir = Path::new(&self.migrations_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        }
    }

    /// Database path resolved against the project root.
    ///
    /// `:memory:` and absolute paths are returned unchanged.
    pub fn database_path_absolute(&self, root: &Path) -> String {
        let path = &self.database.path;
        if path == DEFAULT_DB_PATH || Path::new(path).is_absolute() {
            path.clone()
        } else {
            root.join(path).display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
