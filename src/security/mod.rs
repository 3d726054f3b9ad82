//! Helpers for keeping secrets out of logs and terminal output.

/// Redact sensitive values for safe logging. Shows first 4 chars + "***" suffix.
pub fn redact(value: &str) -> String {
    match value.char_indices().nth(4) {
        Some((idx, _)) => format!("{}***", &value[..idx]),
        None => "***".to_string(),
    }
}

/// Redact an optional secret, rendering an absent one as `(not set)`.
pub fn redact_optional(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => redact(v),
        _ => "(not set)".to_string(),
    }
}
