//! Migration ledger: the table recording every applied migration.
//!
//! The ledger holds no connection of its own. It issues statements on the
//! session it was built with, so writes made inside a migration's transaction
//! commit or roll back together with the migration's statements.

use crate::error::{MigrateError, MigrateResult};
use chrono::NaiveDateTime;
use dw_core::sql_utils::quote_qualified;
use dw_core::{MigrationKind, MigrationRecord, Version};
use dw_db::{Database, DbError, Row, SqlValue};
use std::collections::HashMap;

/// Timestamp layout of `CAST(applied_at AS VARCHAR)`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const RECORD_COLUMNS: &str = "CAST(order_executed AS VARCHAR), version, description, filename, \
     migration_type, CAST(applied_at AS VARCHAR), checksum";

/// Ledger operations over a shared database session.
pub struct Ledger<'a> {
    db: &'a dyn Database,
    table: String,
}

pub(crate) fn parse_timestamp(value: &str) -> MigrateResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| {
        MigrateError::Database(DbError::Internal(format!(
            "unreadable timestamp '{value}': {e}"
        )))
    })
}

fn malformed(what: &str) -> MigrateError {
    MigrateError::Database(DbError::Internal(format!("malformed ledger row: {what}")))
}

fn record_from_row(row: Row) -> MigrateResult<MigrationRecord> {
    let mut cols = row.into_iter();
    let mut next = |name: &str| cols.next().ok_or_else(|| malformed(name));

    let order_executed = next("order_executed")?
        .ok_or_else(|| malformed("order_executed is NULL"))?
        .parse::<i64>()
        .map_err(|_| malformed("order_executed is not an integer"))?;
    let version = next("version")?;
    let description = next("description")?.unwrap_or_default();
    let filename = next("filename")?.ok_or_else(|| malformed("filename is NULL"))?;
    let migration_type = next("migration_type")?
        .ok_or_else(|| malformed("migration_type is NULL"))?
        .parse::<MigrationKind>()
        .map_err(|e| malformed(&e))?;
    let applied_at = parse_timestamp(
        &next("applied_at")?.ok_or_else(|| malformed("applied_at is NULL"))?,
    )?;
    let checksum = next("checksum")?;

    Ok(MigrationRecord {
        order_executed,
        version,
        description,
        filename,
        migration_type,
        applied_at,
        checksum,
    })
}

impl<'a> Ledger<'a> {
    pub fn new(db: &'a dyn Database, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }

    /// Configured table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn quoted(&self) -> String {
        quote_qualified(&self.table)
    }

    /// Create the ledger table if missing.
    pub async fn ensure_table(&self) -> MigrateResult<()> {
        self.db.create_ledger_table(&self.table).await?;
        Ok(())
    }

    pub async fn table_exists(&self) -> MigrateResult<bool> {
        Ok(self.db.relation_exists(&self.table).await?)
    }

    async fn select_records(
        &self,
        filter: &str,
        order: &str,
        params: &[SqlValue],
    ) -> MigrateResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM {} {filter} ORDER BY {order}",
            self.quoted()
        );
        self.db
            .query_rows(&sql, params)
            .await?
            .into_iter()
            .map(record_from_row)
            .collect()
    }

    /// Full history in execution order.
    pub async fn records(&self) -> MigrateResult<Vec<MigrationRecord>> {
        self.select_records("", "applied_at, order_executed", &[])
            .await
    }

    /// Versioned entries in execution order.
    pub async fn versioned_records(&self) -> MigrateResult<Vec<MigrationRecord>> {
        self.select_records(
            "WHERE version IS NOT NULL",
            "applied_at, order_executed",
            &[],
        )
        .await
    }

    /// Most recently applied versioned entry.
    pub async fn latest_versioned_entry(&self) -> MigrateResult<Option<MigrationRecord>> {
        let mut records = self
            .select_records(
                "WHERE version IS NOT NULL",
                "applied_at DESC, order_executed DESC LIMIT 1",
                &[],
            )
            .await?;
        Ok(records.pop())
    }

    /// Applied versions, oldest first.
    pub async fn applied_versions(&self) -> MigrateResult<Vec<String>> {
        Ok(self
            .versioned_records()
            .await?
            .into_iter()
            .filter_map(|r| r.version)
            .collect())
    }

    /// Whether `version` is applied. Versions compare numerically, so `1.5`
    /// matches a recorded `1.5.0`.
    pub async fn is_version_applied(&self, version: &Version) -> MigrateResult<bool> {
        for applied in self.applied_versions().await? {
            if Version::parse(&applied)? == *version {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Record a versioned migration as applied.
    pub async fn record_versioned_apply(
        &self,
        version: &Version,
        description: &str,
        filename: &str,
        checksum: &str,
    ) -> MigrateResult<()> {
        let duplicate = || MigrateError::DuplicateVersion {
            version: version.to_string(),
        };
        if self.is_version_applied(version).await? {
            return Err(duplicate());
        }

        let sql = format!(
            "INSERT INTO {} (version, description, filename, migration_type, checksum) \
             VALUES (?, ?, ?, ?, ?)",
            self.quoted()
        );
        let params = [
            SqlValue::from(version.as_str()),
            SqlValue::from(description),
            SqlValue::from(filename),
            SqlValue::from(MigrationKind::Versioned.as_str()),
            SqlValue::from(checksum),
        ];
        match self.db.execute_with(&sql, &params).await {
            Ok(_) => Ok(()),
            Err(DbError::ConstraintViolation(_)) => Err(duplicate()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a versioned entry. Returns `false` when nothing was recorded.
    pub async fn record_versioned_revert(&self, version: &str) -> MigrateResult<bool> {
        let sql = format!("DELETE FROM {} WHERE version = ?", self.quoted());
        let removed = self
            .db
            .execute_with(&sql, &[SqlValue::from(version)])
            .await?;
        Ok(removed > 0)
    }

    /// Replace the entry for a repeatable migration.
    pub async fn upsert_repeatable(
        &self,
        filename: &str,
        description: &str,
        kind: MigrationKind,
        checksum: &str,
    ) -> MigrateResult<()> {
        let delete = format!(
            "DELETE FROM {} WHERE filename = ? AND version IS NULL",
            self.quoted()
        );
        self.db
            .execute_with(&delete, &[SqlValue::from(filename)])
            .await?;

        let insert = format!(
            "INSERT INTO {} (version, description, filename, migration_type, checksum) \
             VALUES (NULL, ?, ?, ?, ?)",
            self.quoted()
        );
        self.db
            .execute_with(
                &insert,
                &[
                    SqlValue::from(description),
                    SqlValue::from(filename),
                    SqlValue::from(kind.as_str()),
                    SqlValue::from(checksum),
                ],
            )
            .await?;
        Ok(())
    }

    /// Last recorded checksum per filename for one repeatable kind.
    pub async fn repeatable_checksums(
        &self,
        kind: MigrationKind,
    ) -> MigrateResult<HashMap<String, String>> {
        let records = self
            .select_records(
                "WHERE version IS NULL AND migration_type = ?",
                "applied_at, order_executed",
                &[SqlValue::from(kind.as_str())],
            )
            .await?;
        Ok(records
            .into_iter()
            .filter_map(|r| r.checksum.map(|c| (r.filename, c)))
            .collect())
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
