//! History command implementation

use anyhow::{Context, Result};
use dw_core::MigrationRecord;

use crate::cli::{GlobalArgs, OutputArgs};
use crate::commands::format_helpers::{or_dash, render, Table};
use crate::context::RuntimeContext;

/// Execute the history command
pub(crate) async fn execute(args: &OutputArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let records = ctx
        .migrator()
        .history()
        .await
        .context("Failed to read migration history")?;

    print!("{}", render(args.output, &records, |r| history_table(r))?);
    Ok(())
}

fn history_table(records: &[MigrationRecord]) -> String {
    let mut table = Table::new([
        "ORDER",
        "VERSION",
        "TYPE",
        "FILENAME",
        "APPLIED_AT",
        "CHECKSUM",
    ]);
    for record in records {
        let checksum = record
            .checksum
            .as_deref()
            .map(|c| c.chars().take(12).collect::<String>());
        table.push(vec![
            record.order_executed.to_string(),
            or_dash(record.version.as_deref()),
            record.migration_type.to_string(),
            record.filename.clone(),
            record.applied_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            or_dash(checksum.as_deref()),
        ]);
    }
    if table.is_empty() {
        return "No migrations have been applied\n".to_string();
    }
    table.to_string()
}
