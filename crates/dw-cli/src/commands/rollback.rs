//! Rollback command implementation

use anyhow::{Context, Result};
use dw_engine::RollbackOptions;

use crate::cli::{GlobalArgs, RangeArgs};
use crate::context::RuntimeContext;

/// Execute the rollback command
pub(crate) async fn execute(args: &RangeArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let options = RollbackOptions {
        count: args.count,
        to_version: args.to_version.clone(),
    };

    let report = ctx
        .migrator_with_progress()
        .rollback(&options)
        .await
        .context("Rollback failed")?;

    if global.quiet {
        return Ok(());
    }
    if report.rolled_back == 0 {
        println!("No applied migrations to roll back");
    } else {
        println!(
            "\nRolled back {} migrations ({})",
            report.rolled_back,
            report.versions.join(", ")
        );
    }
    Ok(())
}
