//! Conditional request support
//!
//! `ETag` generation and `If-None-Match` evaluation for static file
//! responses.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compute a quoted `ETag` for a body.
///
/// The tag is a fast content hash, not cryptographic; it only needs to change
/// when the content changes.
pub fn etag_for(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Evaluate an `If-None-Match` header against a computed `ETag`.
///
/// Handles a single tag, a comma-separated list, and the `*` wildcard.
/// Returns true when the client's copy is current and a 304 should be sent.
pub fn if_none_match(header: Option<&str>, etag: &str) -> bool {
    header.is_some_and(|client| {
        client
            .split(',')
            .any(|candidate| candidate.trim() == etag || candidate.trim() == "*")
    })
}
