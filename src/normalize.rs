/// Canonical token form: lowercase, trimmed, internal whitespace runs
/// collapsed to a single underscore (the schema key convention).
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Order-preserving, length-preserving normalization of the raw input.
/// Duplicates stay in place; the encoder's set-membership check makes
/// them idempotent later.
pub fn normalize_all(raw: &[String]) -> Vec<String> {
    raw.iter().map(|s| normalize(s)).collect()
}

/// Space-separated form used for substring comparison in the fallback
/// matcher: underscores become single spaces.
pub fn space_form(symptom: &str) -> String {
    symptom.replace('_', " ")
}
