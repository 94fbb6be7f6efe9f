//! Error types for the migration engine.

use dw_core::CoreError;
use dw_db::DbError;
use thiserror::Error;

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Mutually exclusive or out-of-range options (W001).
    #[error("[W001] Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Migrations directory is missing (W002).
    #[error("[W002] Migrations directory not found: {path}. Run 'dbwarden init' first")]
    DirectoryNotFound { path: String },

    /// Another run holds the migration lock (W003).
    #[error("[W003] Migration lock is held (acquired at {acquired_at}). Run 'dbwarden unlock' if no migration is in progress")]
    LockHeld { acquired_at: String },

    /// The lock did not become free in time (W004).
    #[error("[W004] Timed out after {seconds}s waiting for the migration lock")]
    LockTimeout { seconds: u64 },

    /// Version already present in the ledger (W005).
    #[error("[W005] Version {version} is already recorded as applied")]
    DuplicateVersion { version: String },

    /// A migration statement failed; its transaction was rolled back (W006).
    #[error("[W006] Migration '{filename}' failed at statement {statement}: {source}")]
    StatementExecutionFailure {
        filename: String,
        /// 1-based position of the failing statement
        statement: usize,
        #[source]
        source: DbError,
    },

    /// Requested rollback target is not applied (W007).
    #[error("[W007] Version {version} is not applied")]
    VersionNotFound { version: String },

    /// Applied version has no file on disk (W008).
    #[error("[W008] No migration file for applied version {version} in {dir}")]
    MissingFile { version: String, dir: String },

    #[error(transparent)]
    Core(CoreError),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl From<CoreError> for MigrateError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DirectoryNotFound { path } => MigrateError::DirectoryNotFound { path },
            other => MigrateError::Core(other),
        }
    }
}

impl MigrateError {
    /// Whether the failure is about the migration lock being unavailable.
    pub fn is_lock_unavailable(&self) -> bool {
        matches!(
            self,
            MigrateError::LockHeld { .. } | MigrateError::LockTimeout { .. }
        )
    }
}
