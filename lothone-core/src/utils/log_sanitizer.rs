//! Log sanitization utilities
//!
//! Keeps identifiers and credentials out of logs in full. Account keys are
//! bearer secrets for the proxy daemons.

/// Number of trailing characters left visible by [`mask_secret`].
const VISIBLE_SUFFIX: usize = 4;

/// Maximum number of characters to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Masks a secret, keeping only its last four characters.
///
/// Empty input stays empty so "not provided" remains distinguishable in logs.
pub fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let count = s.chars().count();
    if count <= VISIBLE_SUFFIX {
        return "*".repeat(count);
    }
    format!("****{}", last_chars(s, VISIBLE_SUFFIX))
}

/// Last `n` characters of `s` (all of it when shorter).
pub fn last_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let start = s
        .char_indices()
        .rev()
        .nth(n.saturating_sub(1))
        .map_or(0, |(i, _)| i);
    &s[start..]
}

/// Truncate a string for safe logging.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        let mut end = TRUNCATE_LIMIT;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, total {} bytes]", &s[..end], s.len())
    }
}
