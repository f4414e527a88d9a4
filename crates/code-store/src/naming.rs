//! Index name validation and index pattern matching.
//!
//! Valid index names:
//! - Must be non-empty and at most 255 bytes
//! - Must be lowercase
//! - Must not contain `\`, `/`, `*`, `?`, `"`, `<`, `>`, `|`, `,`, `#`, or spaces
//! - Must not start with `-`, `_`, or `+`
//! - Must not be `.` or `..`
//!
//! Patterns are comma-separated lists of names in which `*` matches any run
//! of characters, e.g. `.code-repository*` or `logs-*,metrics-*`.

use crate::error::{StoreError, StoreResult};

/// Characters that are forbidden anywhere in an index name.
const FORBIDDEN_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ',', '#', ' '];

pub const MAX_INDEX_NAME_BYTES: usize = 255;

/// Validate an index name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use code_store::naming::validate_index_name;
///
/// assert!(validate_index_name(".code-repository-github.com-elastic-code").is_ok());
/// assert!(validate_index_name("Upper").is_err());
/// assert!(validate_index_name("_private").is_err());
/// ```
pub fn validate_index_name(name: &str) -> StoreResult<()> {
    let invalid = |reason: String| StoreError::InvalidIndexName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("index name must not be empty".into()));
    }
    if name.len() > MAX_INDEX_NAME_BYTES {
        return Err(invalid(format!(
            "longer than {MAX_INDEX_NAME_BYTES} bytes"
        )));
    }
    if name == "." || name == ".." {
        return Err(invalid("must not be '.' or '..'".into()));
    }
    if name.starts_with(['-', '_', '+']) {
        return Err(invalid("must not start with '-', '_', or '+'".into()));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    if name.chars().any(char::is_uppercase) {
        return Err(invalid("must be lowercase".into()));
    }
    Ok(())
}

/// Returns `true` if `name` matches any entry of a comma-separated pattern.
pub fn matches_index_pattern(pattern: &str, name: &str) -> bool {
    pattern
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .any(|p| glob_match(p, name))
}

/// Returns `true` if the pattern names no wildcard and exactly one index.
pub(crate) fn is_concrete(pattern: &str) -> bool {
    !pattern.contains('*') && !pattern.contains(',')
}

/// `*`-only glob matching.
fn glob_match(pattern: &str, name: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return name.is_empty();
    };
    let Some(mut rest) = name.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        // No `*` in the pattern: exact match.
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
