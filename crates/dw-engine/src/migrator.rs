//! Migration executor.
//!
//! [`Migrator`] resolves pending work from the migrations directory and the
//! ledger, serializes runs through the lock row, and applies or reverts one
//! file per transaction. It holds no connection state of its own beyond the
//! session it is given.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::Ledger;
use crate::lock::{LockManager, DEFAULT_POLL_INTERVAL};
use crate::observer::{Direction, MigrationObserver, MigrationStep, NoopObserver};
use crate::report::{
    ChecksumDrift, LockState, MigrationReport, PendingMigration, RollbackReport, StatusReport,
};
use dw_core::config::{DEFAULT_LEDGER_TABLE, DEFAULT_LOCK_TABLE, DEFAULT_LOCK_TIMEOUT_SECS};
use dw_core::resolver::{list_migrations, list_repeatables, RangeSelection};
use dw_core::{Config, MigrationFile, MigrationKind, MigrationRecord, Version};
use dw_db::Database;
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Where migrations live and how the bookkeeping tables are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratorOptions {
    pub migrations_dir: PathBuf,
    pub ledger_table: String,
    pub lock_table: String,
    pub lock_timeout: Duration,
    pub poll_interval: Duration,
}

impl MigratorOptions {
    /// Defaults for everything but the migrations directory.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            lock_table: DEFAULT_LOCK_TABLE.to_string(),
            lock_timeout: Duration::from_secs(DEFAULT_LOCK_TIMEOUT_SECS),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Options for a project rooted at `root`.
    ///
    /// When the config names a schema, unqualified table names are placed in
    /// it.
    pub fn from_config(config: &Config, root: &Path) -> Self {
        let qualify = |table: &str| match &config.database.schema {
            Some(schema) if !table.contains('.') => format!("{schema}.{table}"),
            _ => table.to_string(),
        };
        Self {
            migrations_dir: config.migrations_dir_absolute(root),
            ledger_table: qualify(&config.ledger_table),
            lock_table: qualify(&config.lock_table),
            lock_timeout: Duration::from_secs(config.lock_timeout_secs),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Bounds for [`Migrator::migrate`]. With neither field set, every pending
/// versioned migration runs, followed by repeatables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrateOptions {
    /// Apply at most this many versions
    pub count: Option<usize>,
    /// Apply versions up to and including this one
    pub to_version: Option<String>,
}

/// Bounds for [`Migrator::rollback`]. With neither field set, the most
/// recently applied version is reverted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackOptions {
    /// Revert this many of the most recently applied versions
    pub count: Option<usize>,
    /// Revert every version applied after this one, and this one
    pub to_version: Option<String>,
}

/// Check `count` / `to_version` before any I/O.
fn validate_range(
    count: Option<usize>,
    to_version: Option<&str>,
) -> MigrateResult<Option<Version>> {
    match (count, to_version) {
        (Some(_), Some(_)) => Err(MigrateError::InvalidArguments(
            "count and to_version are mutually exclusive".to_string(),
        )),
        (Some(0), None) => Err(MigrateError::InvalidArguments(
            "count must be at least 1".to_string(),
        )),
        (None, Some(version)) => Version::parse(version)
            .map(Some)
            .map_err(|e| MigrateError::InvalidArguments(e.to_string())),
        _ => Ok(None),
    }
}

/// Work resolved for one migrate run.
#[derive(Debug, Default)]
struct Plan {
    versioned: Vec<MigrationFile>,
    repeatables: Vec<MigrationFile>,
    out_of_order: Vec<String>,
}

impl Plan {
    fn is_empty(&self) -> bool {
        self.versioned.is_empty() && self.repeatables.is_empty()
    }
}

fn pending(file: &MigrationFile) -> PendingMigration {
    PendingMigration {
        version: file.version_str().map(str::to_string),
        filename: file.filename.clone(),
        description: file.description.clone(),
        kind: file.kind,
    }
}

/// Applies and reverts migrations against one database session.
pub struct Migrator<'a> {
    db: &'a dyn Database,
    options: MigratorOptions,
    observer: Box<dyn MigrationObserver + 'a>,
}

impl<'a> Migrator<'a> {
    pub fn new(db: &'a dyn Database, options: MigratorOptions) -> Self {
        Self {
            db,
            options,
            observer: Box::new(NoopObserver),
        }
    }

    /// Report progress to `observer`.
    pub fn with_observer(mut self, observer: impl MigrationObserver + 'a) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn options(&self) -> &MigratorOptions {
        &self.options
    }

    pub fn ledger(&self) -> Ledger<'a> {
        Ledger::new(self.db, self.options.ledger_table.clone())
    }

    pub fn lock_manager(&self) -> LockManager<'a> {
        LockManager::new(self.db, self.options.lock_table.clone())
            .with_poll_interval(self.options.poll_interval)
    }

    fn migrations_dir(&self) -> MigrateResult<&Path> {
        let dir = self.options.migrations_dir.as_path();
        if !dir.is_dir() {
            return Err(MigrateError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }
        Ok(dir)
    }

    async fn ensure_tables(&self) -> MigrateResult<()> {
        self.ledger().ensure_table().await?;
        self.lock_manager().ensure_table().await
    }

    /// Apply pending migrations.
    pub async fn migrate(&self, opts: &MigrateOptions) -> MigrateResult<MigrationReport> {
        let to_version = validate_range(opts.count, opts.to_version.as_deref())?;
        let dir = self.migrations_dir()?;
        self.ensure_tables().await?;

        let plan = self.plan(dir, opts.count, to_version.as_ref()).await?;
        if plan.is_empty() {
            log::info!("Database is up to date");
            return Ok(MigrationReport::default());
        }

        log::info!(
            "Applying {} versioned and {} repeatable migrations",
            plan.versioned.len(),
            plan.repeatables.len()
        );
        self.lock_manager()
            .with_lock(self.options.lock_timeout, || self.apply_plan(&plan))
            .await
    }

    /// Resolve what an upgrade would run, reading the ledger if it exists.
    async fn plan(
        &self,
        dir: &Path,
        count: Option<usize>,
        to_version: Option<&Version>,
    ) -> MigrateResult<Plan> {
        let ledger = self.ledger();
        let ledger_exists = ledger.table_exists().await?;

        let latest = if ledger_exists {
            match ledger.latest_versioned_entry().await?.and_then(|r| r.version) {
                Some(version) => Some(Version::parse(&version)?),
                None => None,
            }
        } else {
            None
        };

        let mut selection = RangeSelection::all();
        if let Some(latest) = &latest {
            selection = selection.start_after(latest.clone());
        }
        if let Some(end) = to_version {
            selection = selection.end_at(end.clone());
        }

        let mut plan = Plan::default();
        for (version, path) in list_migrations(dir, &selection)? {
            // start_after is positional; when the latest version's file is
            // gone, older files still have to be dropped here
            if latest.as_ref().is_some_and(|latest| version <= *latest) {
                continue;
            }
            if count.is_some_and(|n| plan.versioned.len() >= n) {
                break;
            }
            plan.versioned.push(MigrationFile::load(&path)?);
        }

        if let Some(latest) = &latest {
            let applied = ledger
                .applied_versions()
                .await?
                .iter()
                .map(|v| Version::parse(v))
                .collect::<Result<HashSet<_>, _>>()?;
            let older = list_migrations(dir, &RangeSelection::all().end_at(latest.clone()))?;
            for (version, path) in older {
                if applied.contains(&version) {
                    continue;
                }
                log::warn!(
                    "Ignoring {}: version {} is older than the latest applied version {}",
                    path.display(),
                    version,
                    latest
                );
                plan.out_of_order.push(version.to_string());
            }
        }

        if count.is_none() && to_version.is_none() {
            plan.repeatables = self.pending_repeatables(dir, ledger_exists).await?;
        }

        Ok(plan)
    }

    /// Every runs-always file, plus runs-on-change files whose checksum
    /// differs from the ledger.
    async fn pending_repeatables(
        &self,
        dir: &Path,
        ledger_exists: bool,
    ) -> MigrateResult<Vec<MigrationFile>> {
        let mut files = Vec::new();
        for path in list_repeatables(dir, MigrationKind::RunsAlways)? {
            files.push(MigrationFile::load(&path)?);
        }

        let recorded = if ledger_exists {
            self.ledger()
                .repeatable_checksums(MigrationKind::RunsOnChange)
                .await?
        } else {
            Default::default()
        };
        for path in list_repeatables(dir, MigrationKind::RunsOnChange)? {
            let file = MigrationFile::load(&path)?;
            if recorded.get(&file.filename) == Some(&file.checksum) {
                log::debug!("{} unchanged, skipping", file.filename);
                continue;
            }
            files.push(file);
        }
        Ok(files)
    }

    async fn apply_plan(&self, plan: &Plan) -> MigrateResult<MigrationReport> {
        let total = plan.versioned.len() + plan.repeatables.len();
        self.observer.on_batch_start(total, Direction::Upgrade);

        let result = async {
            let mut report = MigrationReport::default();
            let files = plan.versioned.iter().chain(plan.repeatables.iter());
            for (i, file) in files.enumerate() {
                let step = MigrationStep {
                    filename: &file.filename,
                    version: file.version_str(),
                    kind: file.kind,
                    direction: Direction::Upgrade,
                    index: i + 1,
                    total,
                };
                self.run_step(&step, || self.apply_file(file)).await?;

                match file.version_str() {
                    Some(version) => {
                        report.applied += 1;
                        report.versions.push(version.to_string());
                    }
                    None => {
                        report.repeatables_run += 1;
                        report.repeatables.push(file.filename.clone());
                    }
                }
            }
            Ok::<_, MigrateError>(report)
        }
        .await;

        self.observer.on_batch_end();
        result
    }

    /// Upgrade statements and the ledger write, in one transaction.
    async fn apply_file(&self, file: &MigrationFile) -> MigrateResult<()> {
        self.transaction(|| async {
            self.execute_statements(&file.filename, &file.upgrade_statements)
                .await?;
            let ledger = self.ledger();
            match &file.version {
                Some(version) => {
                    ledger
                        .record_versioned_apply(
                            version,
                            &file.description,
                            &file.filename,
                            &file.checksum,
                        )
                        .await
                }
                None => {
                    ledger
                        .upsert_repeatable(
                            &file.filename,
                            &file.description,
                            file.kind,
                            &file.checksum,
                        )
                        .await
                }
            }
        })
        .await
    }

    /// Revert the most recent versions.
    pub async fn rollback(&self, opts: &RollbackOptions) -> MigrateResult<RollbackReport> {
        let to_version = validate_range(opts.count, opts.to_version.as_deref())?;
        let dir = self.migrations_dir()?;
        self.ensure_tables().await?;

        let mut applied = self.ledger().applied_versions().await?;
        applied.reverse();

        let selected: Vec<String> = match (opts.count, &to_version) {
            (Some(n), _) => applied.into_iter().take(n).collect(),
            (None, Some(target)) => {
                let mut selected = Vec::new();
                let mut found = false;
                for version in applied {
                    let reached = Version::parse(&version)? == *target;
                    selected.push(version);
                    if reached {
                        found = true;
                        break;
                    }
                }
                if !found {
                    return Err(MigrateError::VersionNotFound {
                        version: target.to_string(),
                    });
                }
                selected
            }
            (None, None) => applied.into_iter().take(1).collect(),
        };

        if selected.is_empty() {
            log::info!("Nothing to roll back");
            return Ok(RollbackReport::default());
        }

        // every file must be present before anything is reverted
        let on_disk = list_migrations(dir, &RangeSelection::all())?;
        let mut files = Vec::with_capacity(selected.len());
        for version in selected {
            let path = on_disk.get(&Version::parse(&version)?).ok_or_else(|| {
                MigrateError::MissingFile {
                    version: version.clone(),
                    dir: dir.display().to_string(),
                }
            })?;
            files.push((version, MigrationFile::load(path)?));
        }

        log::info!("Rolling back {} migrations", files.len());
        self.lock_manager()
            .with_lock(self.options.lock_timeout, || self.revert_batch(&files))
            .await
    }

    async fn revert_batch(&self, files: &[(String, MigrationFile)]) -> MigrateResult<RollbackReport> {
        let total = files.len();
        self.observer.on_batch_start(total, Direction::Rollback);

        let result = async {
            let mut report = RollbackReport::default();
            for (i, (version, file)) in files.iter().enumerate() {
                let step = MigrationStep {
                    filename: &file.filename,
                    version: Some(version.as_str()),
                    kind: file.kind,
                    direction: Direction::Rollback,
                    index: i + 1,
                    total,
                };
                self.run_step(&step, || self.revert_file(version, file))
                    .await?;
                report.rolled_back += 1;
                report.versions.push(version.clone());
            }
            Ok::<_, MigrateError>(report)
        }
        .await;

        self.observer.on_batch_end();
        result
    }

    /// Rollback statements and the ledger delete, in one transaction.
    async fn revert_file(&self, version: &str, file: &MigrationFile) -> MigrateResult<()> {
        self.transaction(|| async {
            self.execute_statements(&file.filename, &file.rollback_statements)
                .await?;
            if !self.ledger().record_versioned_revert(version).await? {
                return Err(MigrateError::VersionNotFound {
                    version: version.to_string(),
                });
            }
            Ok(())
        })
        .await
    }

    async fn run_step<F, Fut>(&self, step: &MigrationStep<'_>, body: F) -> MigrateResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MigrateResult<()>>,
    {
        log::info!(
            "[{}/{}] {} {}",
            step.index,
            step.total,
            step.direction,
            step.filename
        );
        self.observer.on_start(step);
        let started = Instant::now();
        match body().await {
            Ok(()) => {
                self.observer.on_complete(step, started.elapsed());
                Ok(())
            }
            Err(e) => {
                self.observer.on_failed(step, &e);
                Err(e)
            }
        }
    }

    async fn execute_statements(&self, filename: &str, statements: &[String]) -> MigrateResult<()> {
        for (i, statement) in statements.iter().enumerate() {
            log::debug!("{} [{}/{}]: {}", filename, i + 1, statements.len(), statement);
            self.db.execute_batch(statement).await.map_err(|source| {
                MigrateError::StatementExecutionFailure {
                    filename: filename.to_string(),
                    statement: i + 1,
                    source,
                }
            })?;
        }
        Ok(())
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    async fn transaction<T, F, Fut>(&self, body: F) -> MigrateResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MigrateResult<T>>,
    {
        self.db.begin().await?;

        let result = body().await;

        match &result {
            Ok(_) => {
                if let Err(commit_err) = self.db.commit().await {
                    let _ = self.db.rollback().await;
                    return Err(commit_err.into());
                }
            }
            Err(_) => {
                if let Err(rollback_err) = self.db.rollback().await {
                    log::warn!("ROLLBACK failed: {rollback_err}");
                }
            }
        }
        result
    }

    /// Applied and pending migrations. Takes no lock and creates nothing.
    pub async fn status(&self) -> MigrateResult<StatusReport> {
        let dir = self.migrations_dir()?;
        let ledger = self.ledger();
        let applied = if ledger.table_exists().await? {
            ledger.versioned_records().await?
        } else {
            Vec::new()
        };

        let plan = self.plan(dir, None, None).await?;
        Ok(StatusReport {
            applied,
            pending: plan.versioned.iter().map(pending).collect(),
            pending_repeatables: plan.repeatables.iter().map(pending).collect(),
            out_of_order: plan.out_of_order,
        })
    }

    /// Full ledger in execution order; empty when the ledger does not exist.
    pub async fn history(&self) -> MigrateResult<Vec<MigrationRecord>> {
        let ledger = self.ledger();
        if !ledger.table_exists().await? {
            return Ok(Vec::new());
        }
        ledger.records().await
    }

    /// Applied versioned migrations whose file changed or disappeared since
    /// they were applied.
    pub async fn verify(&self) -> MigrateResult<Vec<ChecksumDrift>> {
        let dir = self.migrations_dir()?;
        let ledger = self.ledger();
        if !ledger.table_exists().await? {
            return Ok(Vec::new());
        }

        let on_disk = list_migrations(dir, &RangeSelection::all())?;
        let mut drift = Vec::new();
        for record in ledger.versioned_records().await? {
            let Some(version) = record.version else {
                continue;
            };
            let current = match on_disk.get(&Version::parse(&version)?) {
                Some(path) => Some(MigrationFile::load(path)?),
                None => None,
            };
            let current_checksum = current.as_ref().map(|f| f.checksum.clone());
            if current_checksum.is_some() && current_checksum == record.checksum {
                continue;
            }
            log::warn!("Checksum drift for version {version} ({})", record.filename);
            drift.push(ChecksumDrift {
                version,
                filename: current.map_or(record.filename, |f| f.filename),
                recorded: record.checksum,
                current: current_checksum,
            });
        }
        Ok(drift)
    }

    /// Current lock row; unlocked when the lock table does not exist.
    pub async fn lock_state(&self) -> MigrateResult<LockState> {
        let lock = self.lock_manager();
        if !lock.table_exists().await? {
            return Ok(LockState::default());
        }
        lock.state().await
    }

    /// Force-release the lock, e.g. after a crashed run.
    pub async fn unlock(&self) -> MigrateResult<()> {
        let lock = self.lock_manager();
        lock.ensure_table().await?;
        lock.release().await?;
        log::info!("Released migration lock");
        Ok(())
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
