//! Init command implementation - scaffolds migrations for a project

use anyhow::{Context, Result};
use dw_core::config::CONFIG_FILE_NAMES;
use std::fs;
use std::path::Path;

use crate::cli::{GlobalArgs, InitArgs};
use crate::context::load_config;

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    let root = Path::new(&global.project_dir);
    fs::create_dir_all(root)
        .with_context(|| format!("Failed to create directory: {}", root.display()))?;

    let has_config = global.config.is_some()
        || CONFIG_FILE_NAMES.iter().any(|name| root.join(name).exists());

    if !has_config && !args.no_config {
        let safe_db_path = args.database_path.replace('"', "\\\"");
        let config_content = format!(
            r#"migrations_dir: migrations

database:
  type: duckdb
  path: "{db_path}"
  # schema: app

ledger_table: dbwarden_migrations
lock_table: dbwarden_lock
lock_timeout_secs: 300
"#,
            db_path = safe_db_path,
        );
        let path = root.join(CONFIG_FILE_NAMES[0]);
        fs::write(&path, config_content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !global.quiet {
            println!("Created {}", path.display());
        }
    }

    let config = load_config(global, root)?;
    let dir = config.migrations_dir_absolute(root);
    if dir.is_dir() {
        if !global.quiet {
            println!("Migrations directory already exists: {}", dir.display());
        }
        return Ok(());
    }

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    if !global.quiet {
        println!("Created {}", dir.display());
        println!("\nNext: dbwarden new \"create first table\"");
    }
    Ok(())
}
