//! Ledger entry model

use crate::migration::MigrationKind;
use chrono::NaiveDateTime;
use serde::Serialize;

/// One row of the migration ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    /// Insertion sequence number
    pub order_executed: i64,
    /// Version text; `None` for repeatable migrations
    pub version: Option<String>,
    pub description: String,
    pub filename: String,
    pub migration_type: MigrationKind,
    pub applied_at: NaiveDateTime,
    pub checksum: Option<String>,
}

impl MigrationRecord {
    /// Whether this row records a versioned migration.
    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }
}
