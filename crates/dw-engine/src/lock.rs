//! Cooperative migration lock backed by a single database row.
//!
//! Acquisition is one conditional `UPDATE ... WHERE locked = FALSE`; whoever
//! changes the row owns the lock. The lock is advisory and is not tied to a
//! session, so a process that dies while holding it leaves it locked until
//! [`LockManager::release`] is called (the `unlock` command).

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::parse_timestamp;
use crate::report::LockState;
use dw_core::sql_utils::quote_qualified;
use dw_db::Database;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default wait between acquisition attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct LockManager<'a> {
    db: &'a dyn Database,
    table: String,
    poll_interval: Duration,
}

impl<'a> LockManager<'a> {
    pub fn new(db: &'a dyn Database, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn quoted(&self) -> String {
        quote_qualified(&self.table)
    }

    /// Create the lock table and its unlocked row if missing.
    pub async fn ensure_table(&self) -> MigrateResult<()> {
        self.db.create_lock_table(&self.table).await?;
        Ok(())
    }

    pub async fn table_exists(&self) -> MigrateResult<bool> {
        Ok(self.db.relation_exists(&self.table).await?)
    }

    /// Try to take the lock once. Returns whether this call took it.
    pub async fn acquire(&self) -> MigrateResult<bool> {
        let sql = format!(
            "UPDATE {} SET locked = TRUE, acquired_at = now() WHERE id = 1 AND locked = FALSE",
            self.quoted()
        );
        match self.db.execute(&sql).await {
            Ok(changed) => Ok(changed == 1),
            // another session updated the row first
            Err(e) if e.is_conflict() => {
                log::debug!("Lock acquisition lost a write conflict: {e}");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Clear the lock. Releasing an unlocked lock is a no-op.
    pub async fn release(&self) -> MigrateResult<()> {
        let sql = format!(
            "UPDATE {} SET locked = FALSE, acquired_at = NULL WHERE id = 1",
            self.quoted()
        );
        self.db.execute(&sql).await?;
        Ok(())
    }

    /// Current lock row. A missing row reads as unlocked.
    pub async fn state(&self) -> MigrateResult<LockState> {
        let sql = format!(
            "SELECT CAST(locked AS VARCHAR), CAST(acquired_at AS VARCHAR) FROM {} WHERE id = 1",
            self.quoted()
        );
        let rows = self.db.query_rows(&sql, &[]).await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(LockState::default());
        };
        let mut cols = row.into_iter();
        let locked = cols.next().flatten().is_some_and(|v| v == "true");
        let acquired_at = match cols.next().flatten() {
            Some(ts) => Some(parse_timestamp(&ts)?),
            None => None,
        };
        Ok(LockState {
            locked,
            acquired_at,
        })
    }

    /// Whether the lock is currently held by anyone.
    pub async fn check(&self) -> MigrateResult<bool> {
        Ok(self.state().await?.locked)
    }

    /// Poll [`LockManager::acquire`] until it succeeds or `timeout` elapses.
    pub async fn acquire_with_timeout(&self, timeout: Duration) -> MigrateResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.acquire().await? {
                log::info!("Acquired migration lock");
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(MigrateError::LockTimeout {
                    seconds: timeout.as_secs(),
                });
            }
            log::debug!("Migration lock busy, retrying in {:?}", self.poll_interval);
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Run `body` while holding the lock.
    ///
    /// Fails fast with [`MigrateError::LockHeld`] when the lock is already
    /// taken. The lock is released after `body` finishes, whatever its
    /// outcome; an error from `body` wins over an error from the release.
    pub async fn with_lock<T, F, Fut>(&self, timeout: Duration, body: F) -> MigrateResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MigrateResult<T>>,
    {
        let state = self.state().await?;
        if state.locked {
            return Err(MigrateError::LockHeld {
                acquired_at: state
                    .acquired_at
                    .map_or_else(|| "unknown".to_string(), |t| t.to_string()),
            });
        }

        self.acquire_with_timeout(timeout).await?;

        let result = body().await;
        let released = self.release().await;
        match (result, released) {
            (Ok(value), Ok(())) => {
                log::info!("Released migration lock");
                Ok(value)
            }
            (Ok(_), Err(release_err)) => Err(release_err),
            (Err(body_err), released) => {
                if let Err(release_err) = released {
                    log::warn!("Failed to release migration lock: {release_err}");
                } else {
                    log::info!("Released migration lock");
                }
                Err(body_err)
            }
        }
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
