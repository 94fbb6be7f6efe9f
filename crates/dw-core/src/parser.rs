//! Statement extraction from dual-section migration files.
//!
//! A migration file is split into sections introduced by a marker line whose
//! trimmed text is exactly `-- upgrade` or `-- rollback`. Inside a section,
//! consecutive non-blank, non-comment lines form one statement and a blank
//! line ends it. Comment lines (`--`) are skipped wherever they appear without
//! ending the statement being accumulated. Text before the first marker is
//! ignored.

/// Marker line opening the upgrade section.
pub const UPGRADE_MARKER: &str = "-- upgrade";

/// Marker line opening the rollback section.
pub const ROLLBACK_MARKER: &str = "-- rollback";

const COMMENT_PREFIX: &str = "--";

/// Which section of a migration file a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Upgrade,
    Rollback,
}

impl Section {
    fn from_marker(trimmed: &str) -> Option<Self> {
        match trimmed {
            UPGRADE_MARKER => Some(Section::Upgrade),
            ROLLBACK_MARKER => Some(Section::Rollback),
            _ => None,
        }
    }
}

/// Statements extracted from both sections of a migration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSql {
    pub upgrade: Vec<String>,
    pub rollback: Vec<String>,
}

impl MigrationSql {
    fn section_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Upgrade => &mut self.upgrade,
            Section::Rollback => &mut self.rollback,
        }
    }

    /// Close the statement being accumulated, if any, into `section`.
    fn flush(&mut self, section: Option<Section>, current: &mut Vec<&str>) {
        if current.is_empty() {
            return;
        }
        let statement = current.join("\n").trim().to_string();
        current.clear();
        if let Some(section) = section {
            if !statement.is_empty() {
                self.section_mut(section).push(statement);
            }
        }
    }
}

/// Parse both sections of a migration file in a single pass.
pub fn parse_sections(content: &str) -> MigrationSql {
    let mut sql = MigrationSql::default();
    let mut active: Option<Section> = None;
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(section) = Section::from_marker(trimmed) {
            // re-stating the active marker is a no-op
            if active != Some(section) {
                sql.flush(active, &mut current);
                active = Some(section);
            }
            continue;
        }

        if active.is_none() {
            continue;
        }

        if trimmed.is_empty() {
            sql.flush(active, &mut current);
        } else if !trimmed.starts_with(COMMENT_PREFIX) {
            current.push(line);
        }
    }

    sql.flush(active, &mut current);
    sql
}

/// Extract the upgrade statements of a migration file.
pub fn extract_upgrade(content: &str) -> Vec<String> {
    parse_sections(content).upgrade
}

/// Extract the rollback statements of a migration file.
pub fn extract_rollback(content: &str) -> Vec<String> {
    parse_sections(content).rollback
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
