//! Lock inspection and recovery commands

use anyhow::{Context, Result};
use dw_engine::LockState;

use crate::cli::{GlobalArgs, OutputArgs};
use crate::commands::format_helpers::{render, Table};
use crate::context::RuntimeContext;

/// Execute the lock-status command
pub(crate) async fn status(args: &OutputArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let state = ctx
        .migrator()
        .lock_state()
        .await
        .context("Failed to read migration lock")?;

    print!("{}", render(args.output, &state, lock_table)?);
    Ok(())
}

/// Execute the unlock command
pub(crate) async fn unlock(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let migrator = ctx.migrator();
    let before = migrator.lock_state().await?;
    migrator
        .unlock()
        .await
        .context("Failed to release migration lock")?;

    if !global.quiet {
        if before.locked {
            println!("Released migration lock");
        } else {
            println!("Migration lock was not held");
        }
    }
    Ok(())
}

fn lock_table(state: &LockState) -> String {
    let mut table = Table::new(["LOCKED", "ACQUIRED_AT"]);
    table.push(vec![
        state.locked.to_string(),
        state
            .acquired_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table.to_string()
}
