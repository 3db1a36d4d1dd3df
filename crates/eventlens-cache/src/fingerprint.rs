//! Cache keys derived from a fixed-length text prefix.
//!
//! Texts that share the hashed prefix share a cache entry.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of the first `prefix_chars` characters of `text`.
pub fn fingerprint(text: &str, prefix_chars: usize) -> String {
    let end = text
        .char_indices()
        .nth(prefix_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    hex::encode(Sha256::digest(text[..end].as_bytes()))
}
