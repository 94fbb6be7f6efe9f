//! Migration version identifiers and their ordering.
//!
//! A version is a sequence of non-negative integer components separated by
//! `.` or `_` (`1`, `1.5`, `20240215_120000`). Versions compare component by
//! component; a missing trailing component compares as `0`, so `1.5` and
//! `1.5.0` are the same version.

use crate::error::{CoreError, CoreResult};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A parsed migration version.
///
/// Keeps the text it was parsed from so ledger rows and file names round-trip
/// exactly; equality, ordering and hashing only look at the numeric
/// components.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    components: Vec<u64>,
}

impl Version {
    /// Parse a version string.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidVersion {
            version: s.to_string(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(invalid("version is empty"));
        }

        let components = s
            .split(['.', '_'])
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("components must be non-empty digit runs"));
                }
                part.parse::<u64>()
                    .map_err(|_| invalid("component does not fit in 64 bits"))
            })
            .collect::<CoreResult<Vec<u64>>>()?;

        Ok(Self {
            raw: s.to_string(),
            components,
        })
    }

    /// The version exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric components in order.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Leading component, used to suggest the next version number.
    pub fn major(&self) -> u64 {
        self.components[0]
    }

    /// Components with trailing zeros removed; two versions are equal iff
    /// these slices are equal.
    fn significant(&self) -> &[u64] {
        let end = self
            .components
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |i| i + 1);
        &self.components[..end]
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Compare two version strings.
pub fn compare_versions(v1: &str, v2: &str) -> CoreResult<Ordering> {
    Ok(Version::parse(v1)?.cmp(&Version::parse(v2)?))
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
