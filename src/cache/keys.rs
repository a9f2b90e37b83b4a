//! Deterministic cache key derivation.
//!
//! Identical logical requests must hash to the same key; any differing
//! field must produce a different key. Fields are length-delimited by a
//! separator byte so adjacent fields cannot collide by concatenation.

use sha2::{Digest, Sha256};

const FIELD_SEPARATOR: u8 = 0x1f;

/// Digest of (operation, normalized input fields), prefixed with the
/// operation name so keys stay greppable in redis.
pub fn cache_key(operation: &str, fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    for field in fields {
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(field.as_bytes());
    }
    format!("{}:{}", operation, hex::encode(hasher.finalize()))
}

/// Collapse whitespace and drop empty entries so that "a, b" and "a,b"
/// key identically.
pub fn normalize_keywords(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
