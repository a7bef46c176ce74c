//! Helpers shared across the pipeline jobs.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Number of characters kept from the encoded URL digest.
pub const URL_ID_LEN: usize = 16;

/// Derive the stable identifier for a source URL.
///
/// The id is the URL-safe base64 encoding (no padding) of the SHA-256
/// digest of the URL, truncated to [`URL_ID_LEN`] characters. Being a pure
/// function of the URL, it lets the discovery job detect duplicates with a
/// single conflicting insert instead of a prior read.
pub fn url_id(source_url: &str) -> String {
    let digest = Sha256::digest(source_url.as_bytes());
    let encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded[..URL_ID_LEN].to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes with a byte-count indicator
/// appended, so a full article body never floods the log output.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}
