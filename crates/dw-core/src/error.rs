//! Error types for dw-core

use thiserror::Error;

/// Core error type for dbwarden
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {0}")]
    ConfigParseError(#[from] serde_yaml::Error),

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Migrations directory not found
    #[error("[E004] Migrations directory not found: {path}. Run 'dbwarden init' first")]
    DirectoryNotFound { path: String },

    /// E005: Version string is not dotted-numeric
    #[error("[E005] Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// E006: Two migration files resolve to the same version
    #[error("[E006] Duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateVersionFile {
        version: String,
        first: String,
        second: String,
    },

    /// E007: File name does not follow any migration naming convention
    #[error("[E007] '{filename}' is not a migration file name (expected V<version>__<description>.sql, RA__<description>.sql or ROC__<description>.sql)")]
    InvalidMigrationFilename { filename: String },

    /// E008: IO error with file path context
    #[error("[E008] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Wrap an IO error with the path that caused it.
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        CoreError::IoWithPath {
            path: path.display().to_string(),
            source,
        }
    }
}
