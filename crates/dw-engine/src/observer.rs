//! Progress callbacks for migration runs.

use crate::error::MigrateError;
use dw_core::MigrationKind;
use std::time::Duration;

/// Whether a step applies or reverts a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upgrade,
    Rollback,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Upgrade => write!(f, "upgrade"),
            Direction::Rollback => write!(f, "rollback"),
        }
    }
}

/// One migration file being applied or reverted within a batch.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep<'a> {
    pub filename: &'a str,
    pub version: Option<&'a str>,
    pub kind: MigrationKind,
    pub direction: Direction,
    /// 1-based position within the batch
    pub index: usize,
    pub total: usize,
}

/// Receives progress events from the executor. All methods default to no-ops.
pub trait MigrationObserver: Send + Sync {
    /// Called once the lock is held, before the first step.
    fn on_batch_start(&self, _total: usize, _direction: Direction) {}

    fn on_start(&self, _step: &MigrationStep<'_>) {}

    fn on_complete(&self, _step: &MigrationStep<'_>, _elapsed: Duration) {}

    fn on_failed(&self, _step: &MigrationStep<'_>, _error: &MigrateError) {}

    /// Called after the last step, whether or not the batch succeeded.
    fn on_batch_end(&self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MigrationObserver for NoopObserver {}
