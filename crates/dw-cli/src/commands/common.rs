//! Shared utilities for CLI commands

use dw_core::CoreError;
use dw_engine::MigrateError;
use std::fmt;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs prints nothing for it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Generic failure
pub(crate) const EXIT_FAILURE: i32 = 1;
/// Invalid or conflicting arguments
pub(crate) const EXIT_INVALID_ARGS: i32 = 2;
/// Migration lock held by another run, or not released in time
pub(crate) const EXIT_LOCK_UNAVAILABLE: i32 = 3;
/// Migrations directory does not exist
pub(crate) const EXIT_MISSING_DIR: i32 = 4;

/// Map an error chain to the process exit code.
pub(crate) fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(code) = err.downcast_ref::<ExitCode>() {
        return code.0;
    }
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<MigrateError>() {
            return match e {
                MigrateError::InvalidArguments(_) => EXIT_INVALID_ARGS,
                MigrateError::LockHeld { .. } | MigrateError::LockTimeout { .. } => {
                    EXIT_LOCK_UNAVAILABLE
                }
                MigrateError::DirectoryNotFound { .. } => EXIT_MISSING_DIR,
                _ => EXIT_FAILURE,
            };
        }
        if let Some(CoreError::DirectoryNotFound { .. }) = cause.downcast_ref::<CoreError>() {
            return EXIT_MISSING_DIR;
        }
    }
    EXIT_FAILURE
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
