//! Migration discovery and version range selection

use crate::error::{CoreError, CoreResult};
use crate::migration::{parse_filename, MigrationFile, MigrationKind};
use crate::version::Version;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Filters applied by [`list_migrations`], in this order: `start_after`,
/// `end_at`, then `limit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSelection {
    /// Keep only versions positioned after this one. Ignored when the version
    /// has no file.
    pub start_after: Option<Version>,
    /// Keep only versions `<=` this one.
    pub end_at: Option<Version>,
    /// Keep at most this many versions.
    pub limit: Option<usize>,
}

impl RangeSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn start_after(mut self, version: Version) -> Self {
        self.start_after = Some(version);
        self
    }

    pub fn end_at(mut self, version: Version) -> Self {
        self.end_at = Some(version);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Regular files in `dir` with UTF-8 names, sorted by name.
/// A missing directory yields an empty list.
fn sorted_entries(dir: &Path) -> CoreResult<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| CoreError::io(dir, e))? {
        let entry = entry.map_err(|e| CoreError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => entries.push((name, path)),
            Err(name) => log::warn!("Skipping non UTF-8 file name {:?}", name),
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Versioned migration files in `dir`, ascending by version.
///
/// Files that are not versioned migrations are skipped. Two files resolving to
/// the same version (including `1.5` and `1.5.0`) are an error.
pub fn list_migrations(
    dir: &Path,
    selection: &RangeSelection,
) -> CoreResult<BTreeMap<Version, PathBuf>> {
    let mut found: BTreeMap<Version, (String, PathBuf)> = BTreeMap::new();

    for (name, path) in sorted_entries(dir)? {
        let Some(parsed) = parse_filename(&name) else {
            continue;
        };
        let Some(version) = parsed.version else {
            continue;
        };
        match found.entry(version) {
            Entry::Vacant(slot) => {
                slot.insert((name, path));
            }
            Entry::Occupied(existing) => {
                return Err(CoreError::DuplicateVersionFile {
                    version: existing.key().to_string(),
                    first: existing.get().0.clone(),
                    second: name,
                });
            }
        }
    }

    let mut migrations: BTreeMap<Version, PathBuf> = found
        .into_iter()
        .map(|(version, (_, path))| (version, path))
        .collect();

    if let Some(start) = &selection.start_after {
        if migrations.contains_key(start) {
            let mut after = migrations.split_off(start);
            after.remove(start);
            migrations = after;
        }
    }

    if let Some(end) = &selection.end_at {
        migrations.retain(|version, _| version <= end);
    }

    if let Some(limit) = selection.limit {
        migrations = migrations.into_iter().take(limit).collect();
    }

    Ok(migrations)
}

/// Repeatable migration files of one kind, in filename order.
pub fn list_repeatables(dir: &Path, kind: MigrationKind) -> CoreResult<Vec<PathBuf>> {
    if !kind.is_repeatable() {
        return Ok(Vec::new());
    }
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|(name, _)| parse_filename(name).is_some_and(|p| p.kind == kind))
        .map(|(_, path)| path)
        .collect())
}

/// Load every migration file in `dir`: versioned ones ascending, then
/// runs-always, then runs-on-change.
pub fn discover(dir: &Path) -> CoreResult<Vec<MigrationFile>> {
    let mut files = Vec::new();
    for path in list_migrations(dir, &RangeSelection::all())?.values() {
        files.push(MigrationFile::load(path)?);
    }
    for kind in [MigrationKind::RunsAlways, MigrationKind::RunsOnChange] {
        for path in list_repeatables(dir, kind)? {
            files.push(MigrationFile::load(&path)?);
        }
    }
    log::debug!("Discovered {} migration files in {}", files.len(), dir.display());
    Ok(files)
}

/// Resolve the migrations directory under a project root.
pub fn migrations_directory(root: &Path, name: &str) -> CoreResult<PathBuf> {
    let dir = root.join(name);
    if !dir.is_dir() {
        return Err(CoreError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }
    Ok(dir)
}

/// Next free version number: the highest leading component plus one, or `1`
/// for an empty directory.
pub fn next_version(dir: &Path) -> CoreResult<String> {
    let migrations = list_migrations(dir, &RangeSelection::all())?;
    let next = migrations
        .keys()
        .map(Version::major)
        .max()
        .map_or(1, |major| major + 1);
    Ok(next.to_string())
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
