//! Runtime context for CLI commands

use anyhow::{Context, Result};
use dw_core::Config;
use dw_db::{Database, DatabaseSchema, DuckDbBackend};
use dw_engine::{Migrator, MigratorOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::GlobalArgs;
use crate::commands::progress::ProgressObserver;

/// Loaded configuration and an open database session for one invocation
pub(crate) struct RuntimeContext {
    /// Project root that relative paths resolve against
    pub root: PathBuf,

    /// Config file contents with command-line overrides applied
    pub config: Config,

    /// Database session shared by every step of the command
    pub db: Arc<dyn Database>,

    /// Suppress progress bars
    pub quiet: bool,
}

impl RuntimeContext {
    /// Load the config and open the database without touching the ledger.
    pub(crate) async fn new(args: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);
        let config = load_config(args, &root)?;

        let db_path = config.database_path_absolute(&root);
        log::debug!("Opening database {db_path}");
        let backend = DuckDbBackend::new(&db_path)
            .with_context(|| format!("Failed to connect to database: {db_path}"))?;

        if let Some(schema) = &config.database.schema {
            backend
                .create_schema_if_not_exists(schema)
                .await
                .with_context(|| format!("Failed to create schema {schema}"))?;
            backend
                .use_schema(schema)
                .await
                .with_context(|| format!("Failed to select schema {schema}"))?;
        }

        Ok(Self {
            root,
            config,
            db: Arc::new(backend),
            quiet: args.quiet,
        })
    }

    pub(crate) fn migrator_options(&self) -> MigratorOptions {
        MigratorOptions::from_config(&self.config, &self.root)
    }

    /// Migrator without progress output, for read-only commands.
    pub(crate) fn migrator(&self) -> Migrator<'_> {
        Migrator::new(self.db.as_ref(), self.migrator_options())
    }

    /// Migrator that draws a progress bar unless `--quiet` was given.
    pub(crate) fn migrator_with_progress(&self) -> Migrator<'_> {
        let migrator = self.migrator();
        if self.quiet {
            migrator
        } else {
            migrator.with_observer(ProgressObserver::new())
        }
    }
}

/// Read the config file (or defaults) and apply command-line overrides.
pub(crate) fn load_config(args: &GlobalArgs, root: &Path) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            Config::load(Path::new(path)).context("Failed to load configuration file")?
        }
        None => Config::load_or_default(root).context("Failed to load project configuration")?,
    };

    if let Some(database) = &args.database {
        config.database.path = database.clone();
    }
    if let Some(schema) = &args.schema {
        config.database.schema = Some(schema.clone());
    }
    if let Some(secs) = args.lock_timeout {
        config.lock_timeout_secs = secs;
    }
    config
        .validate()
        .context("Invalid configuration after applying command-line overrides")?;

    log::debug!(
        "Migrations in {}, lock timeout {:?}",
        config.migrations_dir_absolute(root).display(),
        Duration::from_secs(config.lock_timeout_secs)
    );
    Ok(config)
}
