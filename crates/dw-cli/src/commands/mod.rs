//! CLI command implementations

pub(crate) mod common;
pub(crate) mod format_helpers;
pub(crate) mod history;
pub(crate) mod init;
pub(crate) mod lock;
pub(crate) mod migrate;
pub(crate) mod new;
pub(crate) mod progress;
pub(crate) mod rollback;
pub(crate) mod status;
pub(crate) mod verify;
