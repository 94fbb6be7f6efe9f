//! Output rendering shared by the reporting commands.
//!
//! Every report is `Serialize`; JSON and YAML come straight from serde, the
//! table form is built by the caller as a [`Table`].

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::OutputFormat;

/// Plain-text table with left-aligned columns.
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub(crate) fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }
        widths
    }
}

fn write_row(
    f: &mut std::fmt::Formatter<'_>,
    cells: &[String],
    widths: &[usize],
) -> std::fmt::Result {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    writeln!(f, "{}", padded.join("  ").trim_end())
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths = self.widths();
        write_row(f, &self.headers, &widths)?;
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_row(f, &separator, &widths)?;
        for row in &self.rows {
            write_row(f, row, &widths)?;
        }
        Ok(())
    }
}

/// Render `value` in the requested format. `table` is only called for
/// [`OutputFormat::Table`].
pub(crate) fn render<T: Serialize>(
    format: OutputFormat,
    value: &T,
    table: impl FnOnce(&T) -> String,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table(value)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to serialize to JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to serialize to YAML"),
    }
}

/// `-` for absent values in table cells.
pub(crate) fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[cfg(test)]
#[path = "format_helpers_test.rs"]
mod tests;
