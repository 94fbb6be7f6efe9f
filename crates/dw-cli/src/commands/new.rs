//! New command implementation - writes an empty migration file

use anyhow::{Context, Result};
use dw_core::migration::{repeatable_filename, versioned_filename, MIGRATION_TEMPLATE};
use dw_core::resolver::{list_migrations, migrations_directory, next_version, RangeSelection};
use dw_core::{MigrationKind, Version};
use std::path::Path;

use crate::cli::{GlobalArgs, NewArgs, RepeatableKind};
use crate::context::load_config;

/// Execute the new command
pub(crate) async fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let description = args.description.trim();
    if description.is_empty() || !description.chars().any(|c| c.is_ascii_alphanumeric()) {
        anyhow::bail!("Migration description must contain at least one letter or digit");
    }

    let root = Path::new(&global.project_dir);
    let config = load_config(global, root)?;
    let dir = migrations_directory(root, &config.migrations_dir)?;

    let filename = match args.repeatable {
        Some(kind) => {
            let kind = match kind {
                RepeatableKind::Always => MigrationKind::RunsAlways,
                RepeatableKind::OnChange => MigrationKind::RunsOnChange,
            };
            repeatable_filename(kind, description)
                .context("Repeatable kinds always have a filename prefix")?
        }
        None => {
            let version = match &args.at_version {
                Some(v) => {
                    let version = Version::parse(v)?;
                    if list_migrations(&dir, &RangeSelection::all())?.contains_key(&version) {
                        anyhow::bail!("A migration with version {} already exists", version);
                    }
                    version.to_string()
                }
                None => next_version(&dir)?,
            };
            versioned_filename(&version, description)
        }
    };

    let path = dir.join(&filename);
    if path.exists() {
        anyhow::bail!("Migration file already exists: {}", path.display());
    }
    std::fs::write(&path, MIGRATION_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if global.quiet {
        println!("{}", path.display());
    } else {
        println!("Created {}", path.display());
    }
    Ok(())
}
