//! Query-string helpers.
//!
//! Parameters arrive as optional strings so that a malformed value produces
//! the endpoint's own 400 body rather than an extractor rejection.

/// Trimmed, non-empty value of an optional parameter.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an integer parameter. The whole (trimmed) value must be an
/// optionally signed decimal integer.
pub fn parse_int(value: &Option<String>) -> Option<i64> {
    non_empty(value)?.parse().ok()
}

/// Parse a strictly positive integer parameter.
pub fn parse_positive(value: &Option<String>) -> Option<i64> {
    parse_int(value).filter(|n| *n > 0)
}

/// Boolean flag that is on whenever the key is present, whatever its value
/// (`?only_title`, `?only_title=`, `?only_title=false` all enable it).
pub fn flag_present(value: &Option<String>) -> bool {
    value.is_some()
}
