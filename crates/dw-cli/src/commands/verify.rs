//! Verify command implementation - detects edited or deleted migrations

use anyhow::{Context, Result};
use dw_engine::ChecksumDrift;

use crate::cli::{GlobalArgs, OutputArgs};
use crate::commands::common::{ExitCode, EXIT_FAILURE};
use crate::commands::format_helpers::{or_dash, render, Table};
use crate::context::RuntimeContext;

/// Execute the verify command
pub(crate) async fn execute(args: &OutputArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let drift = ctx
        .migrator()
        .verify()
        .await
        .context("Failed to verify migrations")?;

    print!("{}", render(args.output, &drift, |d| drift_table(d))?);
    if !drift.is_empty() {
        return Err(ExitCode(EXIT_FAILURE).into());
    }
    Ok(())
}

fn drift_table(drift: &[ChecksumDrift]) -> String {
    if drift.is_empty() {
        return "All applied migrations match their files\n".to_string();
    }
    let mut table = Table::new(["VERSION", "FILENAME", "PROBLEM"]);
    for entry in drift {
        let problem = match &entry.current {
            None => "file missing".to_string(),
            Some(current) => format!(
                "checksum changed ({} -> {})",
                or_dash(entry.recorded.as_deref().map(short)),
                short(current)
            ),
        };
        table.push(vec![entry.version.clone(), entry.filename.clone(), problem]);
    }
    table.to_string()
}

fn short(checksum: &str) -> &str {
    checksum.get(..12).unwrap_or(checksum)
}
