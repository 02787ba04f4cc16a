//! Log sanitization utilities
//!
//! Provider responses can be large (full record listings) and request
//! payloads can carry tokens, so bodies are cut before they reach a log line.

/// Maximum number of bytes to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index)
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0)
}

/// Truncate a string for safe logging.
///
/// Strings within the limit are returned as-is; longer ones keep their first
/// `TRUNCATE_LIMIT` bytes (on a char boundary) and note the original length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}
