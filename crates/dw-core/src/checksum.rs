//! SHA-256 checksum utility for change detection.

use sha2::{Digest, Sha256};

/// Delimiter placed between statements before hashing.
pub const STATEMENT_DELIMITER: &str = ";";

/// Compute SHA256 checksum of a string
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Checksum of an ordered statement list.
///
/// Statements are joined with [`STATEMENT_DELIMITER`] in their extracted
/// order, so reordering statements or editing whitespace inside one changes
/// the digest.
pub fn statements_checksum<S: AsRef<str>>(statements: &[S]) -> String {
    let joined = statements
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(STATEMENT_DELIMITER);
    compute_checksum(&joined)
}
