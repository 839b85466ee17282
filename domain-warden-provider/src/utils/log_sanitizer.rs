//! Log sanitization helpers.
//!
//! Zone payloads can hold TXT records with DKIM keys or verification tokens, and
//! threat-intel responses can be large; only a prefix of them goes to the log.

/// Maximum number of bytes kept in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Largest char boundary not above `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Truncate `s` to at most `TRUNCATE_LIMIT` bytes for logging, appending the
/// original length when something was cut.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        return s.to_string();
    }
    format!(
        "{}... [truncated, total {} bytes]",
        &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
        s.len()
    )
}
