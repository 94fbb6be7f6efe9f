//! Migrate command implementation

use anyhow::{Context, Result};
use dw_engine::MigrateOptions;

use crate::cli::{GlobalArgs, RangeArgs};
use crate::context::RuntimeContext;

/// Execute the migrate command
pub(crate) async fn execute(args: &RangeArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let options = MigrateOptions {
        count: args.count,
        to_version: args.to_version.clone(),
    };

    let report = ctx
        .migrator_with_progress()
        .migrate(&options)
        .await
        .context("Migration failed")?;

    if global.quiet {
        return Ok(());
    }
    if report.is_up_to_date() {
        println!("Database is up to date");
        return Ok(());
    }

    println!();
    if !report.versions.is_empty() {
        println!(
            "Applied {} versioned migrations ({})",
            report.applied,
            report.versions.join(", ")
        );
    }
    if !report.repeatables.is_empty() {
        println!(
            "Ran {} repeatable migrations ({})",
            report.repeatables_run,
            report.repeatables.join(", ")
        );
    }
    Ok(())
}
