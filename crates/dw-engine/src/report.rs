//! Summaries returned by engine operations.

use chrono::NaiveDateTime;
use dw_core::{MigrationKind, MigrationRecord};
use serde::Serialize;

/// Outcome of [`crate::Migrator::migrate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Number of versioned migrations applied
    pub applied: usize,
    /// Number of repeatable migrations run
    pub repeatables_run: usize,
    /// Applied versions, in application order
    pub versions: Vec<String>,
    /// Filenames of the repeatable migrations run
    pub repeatables: Vec<String>,
}

impl MigrationReport {
    pub fn is_up_to_date(&self) -> bool {
        self.applied == 0 && self.repeatables_run == 0
    }
}

/// Outcome of [`crate::Migrator::rollback`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    pub rolled_back: usize,
    /// Reverted versions, newest first
    pub versions: Vec<String>,
}

/// A migration file that would run on the next unbounded migrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMigration {
    pub version: Option<String>,
    pub filename: String,
    pub description: String,
    pub kind: MigrationKind,
}

/// Applied and pending migrations, from [`crate::Migrator::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Versioned ledger entries in application order
    pub applied: Vec<MigrationRecord>,
    /// Versioned files newer than the latest applied version
    pub pending: Vec<PendingMigration>,
    /// Repeatable files that would run
    pub pending_repeatables: Vec<PendingMigration>,
    /// Unapplied versioned files at or below the latest applied version;
    /// migrate never picks these up
    pub out_of_order: Vec<String>,
}

/// An applied versioned migration whose file no longer matches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumDrift {
    pub version: String,
    pub filename: String,
    pub recorded: Option<String>,
    /// `None` when the file is gone
    pub current: Option<String>,
}

/// Snapshot of the lock row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LockState {
    pub locked: bool,
    pub acquired_at: Option<NaiveDateTime>,
}
