//! dw-engine - Migration engine for dbwarden
//!
//! Runs versioned and repeatable migrations against a [`dw_db::Database`]
//! session: the ledger records what has been applied, the lock row keeps
//! concurrent runs apart, and [`Migrator`] ties them to the files on disk.

pub mod error;
pub mod ledger;
pub mod lock;
pub mod migrator;
pub mod observer;
pub mod report;

pub use error::{MigrateError, MigrateResult};
pub use ledger::Ledger;
pub use lock::LockManager;
pub use migrator::{MigrateOptions, Migrator, MigratorOptions, RollbackOptions};
pub use observer::{Direction, MigrationObserver, MigrationStep, NoopObserver};
pub use report::{
    ChecksumDrift, LockState, MigrationReport, PendingMigration, RollbackReport, StatusReport,
};
