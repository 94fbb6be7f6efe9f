//! Migration file model and filename conventions
//!
//! Three kinds of file are recognised in a migrations directory:
//!
//! - `V<version>__<description>.sql`: versioned, applied once in order
//! - `RA__<description>.sql`: runs always, on every unbounded migrate
//! - `ROC__<description>.sql`: runs on change, when its checksum differs
//!
//! Anything else is ignored by discovery.

use crate::checksum::statements_checksum;
use crate::error::{CoreError, CoreResult};
use crate::parser::parse_sections;
use crate::version::Version;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

/// Filename prefix of runs-always migrations.
pub const RUNS_ALWAYS_PREFIX: &str = "RA__";

/// Filename prefix of runs-on-change migrations.
pub const RUNS_ON_CHANGE_PREFIX: &str = "ROC__";

/// Filename prefix of versioned migrations.
pub const VERSIONED_PREFIX: &str = "V";

const SQL_EXTENSION: &str = ".sql";

/// How a migration is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationKind {
    /// Applied once, in version order
    Versioned,
    /// Re-applied on every unbounded run
    RunsAlways,
    /// Re-applied when its checksum changes
    RunsOnChange,
}

impl MigrationKind {
    /// Value stored in the ledger's `migration_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationKind::Versioned => "versioned",
            MigrationKind::RunsAlways => "runs_always",
            MigrationKind::RunsOnChange => "runs_on_change",
        }
    }

    /// Whether this kind carries no version and may be applied repeatedly.
    pub fn is_repeatable(&self) -> bool {
        !matches!(self, MigrationKind::Versioned)
    }
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "versioned" => Ok(MigrationKind::Versioned),
            "runs_always" => Ok(MigrationKind::RunsAlways),
            "runs_on_change" => Ok(MigrationKind::RunsOnChange),
            other => Err(format!("unknown migration type '{other}'")),
        }
    }
}

/// Identity parsed from a migration filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub kind: MigrationKind,
    pub version: Option<Version>,
    pub description: String,
}

fn versioned_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^V(\d+(?:[._]\d+)*)__(.+)\.sql$").expect("valid regex literal")
    })
}

fn repeatable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(RA|ROC)__(.+)\.sql$").expect("valid regex literal"))
}

/// Classify a filename, returning `None` for files that are not migrations.
pub fn parse_filename(filename: &str) -> Option<ParsedFilename> {
    if let Some(caps) = versioned_pattern().captures(filename) {
        let version = Version::parse(&caps[1]).ok()?;
        return Some(ParsedFilename {
            kind: MigrationKind::Versioned,
            version: Some(version),
            description: humanize(&caps[2]),
        });
    }

    let caps = repeatable_pattern().captures(filename)?;
    let kind = match &caps[1] {
        "RA" => MigrationKind::RunsAlways,
        _ => MigrationKind::RunsOnChange,
    };
    Some(ParsedFilename {
        kind,
        version: None,
        description: humanize(&caps[2]),
    })
}

/// Human-readable description from a migration filename.
///
/// Takes the text after the first `__`, drops the `.sql` extension and turns
/// underscores into spaces. Names without `__` use the whole stem.
pub fn description_from_filename(filename: &str) -> String {
    let rest = filename
        .split_once("__")
        .map_or(filename, |(_, after)| after);
    humanize(rest.strip_suffix(SQL_EXTENSION).unwrap_or(rest))
}

fn humanize(s: &str) -> String {
    s.replace('_', " ").trim().to_string()
}

fn slug(description: &str) -> String {
    description
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// File name for a new versioned migration, e.g. `V3__add_orders.sql`.
pub fn versioned_filename(version: &str, description: &str) -> String {
    format!("{VERSIONED_PREFIX}{version}__{}{SQL_EXTENSION}", slug(description))
}

/// File name for a new repeatable migration, e.g. `ROC__user_views.sql`.
/// Returns `None` for [`MigrationKind::Versioned`].
pub fn repeatable_filename(kind: MigrationKind, description: &str) -> Option<String> {
    let prefix = match kind {
        MigrationKind::Versioned => return None,
        MigrationKind::RunsAlways => RUNS_ALWAYS_PREFIX,
        MigrationKind::RunsOnChange => RUNS_ON_CHANGE_PREFIX,
    };
    Some(format!("{prefix}{}{SQL_EXTENSION}", slug(description)))
}

/// Body written into freshly created migration files.
pub const MIGRATION_TEMPLATE: &str = "-- upgrade\n\n\n\n-- rollback\n\n";

/// A migration file loaded from disk with its statements extracted.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationFile {
    pub version: Option<Version>,
    pub filename: String,
    pub filepath: PathBuf,
    pub kind: MigrationKind,
    pub description: String,
    pub upgrade_statements: Vec<String>,
    pub rollback_statements: Vec<String>,
    /// Checksum over the upgrade statements
    pub checksum: String,
}

impl MigrationFile {
    /// Read and parse a migration file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::InvalidMigrationFilename {
                filename: path.display().to_string(),
            })?
            .to_string();

        let parsed =
            parse_filename(&filename).ok_or_else(|| CoreError::InvalidMigrationFilename {
                filename: filename.clone(),
            })?;

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        Ok(Self::from_content(parsed, filename, path.to_path_buf(), &content))
    }

    fn from_content(
        parsed: ParsedFilename,
        filename: String,
        filepath: PathBuf,
        content: &str,
    ) -> Self {
        let sql = parse_sections(content);
        let checksum = statements_checksum(&sql.upgrade);
        log::debug!(
            "Parsed {}: {} upgrade / {} rollback statements",
            filename,
            sql.upgrade.len(),
            sql.rollback.len()
        );
        Self {
            version: parsed.version,
            filename,
            filepath,
            kind: parsed.kind,
            description: parsed.description,
            upgrade_statements: sql.upgrade,
            rollback_statements: sql.rollback,
            checksum,
        }
    }

    /// Version as written in the filename, if versioned.
    pub fn version_str(&self) -> Option<&str> {
        self.version.as_ref().map(Version::as_str)
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
