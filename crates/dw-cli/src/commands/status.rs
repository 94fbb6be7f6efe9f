//! Status command implementation

use anyhow::{Context, Result};
use dw_engine::StatusReport;

use crate::cli::{GlobalArgs, OutputArgs};
use crate::commands::format_helpers::{or_dash, render, Table};
use crate::context::RuntimeContext;

/// Execute the status command
pub(crate) async fn execute(args: &OutputArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let report = ctx
        .migrator()
        .status()
        .await
        .context("Failed to read migration status")?;

    print!("{}", render(args.output, &report, status_table)?);
    Ok(())
}

fn status_table(report: &StatusReport) -> String {
    let mut table = Table::new(["STATE", "VERSION", "TYPE", "DESCRIPTION", "APPLIED_AT"]);
    for record in &report.applied {
        table.push(vec![
            "applied".to_string(),
            or_dash(record.version.as_deref()),
            record.migration_type.to_string(),
            record.description.clone(),
            record.applied_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    for pending in report.pending.iter().chain(&report.pending_repeatables) {
        table.push(vec![
            "pending".to_string(),
            or_dash(pending.version.as_deref()),
            pending.kind.to_string(),
            pending.description.clone(),
            "-".to_string(),
        ]);
    }

    let mut out = table.to_string();
    out.push_str(&format!(
        "\n{} applied, {} pending, {} repeatable pending\n",
        report.applied.len(),
        report.pending.len(),
        report.pending_repeatables.len()
    ));
    if !report.out_of_order.is_empty() {
        out.push_str(&format!(
            "Ignored (older than latest applied): {}\n",
            report.out_of_order.join(", ")
        ));
    }
    out
}
