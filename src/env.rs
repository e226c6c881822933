use crate::store::{KEY_DELIMITER, child_key};

/// Separator between nesting levels in environment variable names.
pub const ENV_SEPARATOR: &str = "__";

/// Collect `(key, value)` pairs from environment variables matching `{PREFIX}__*`.
///
/// Double underscore `__` separates nesting levels and becomes `:`.
/// Single `_` within a segment is literal (part of the field name).
/// Segments are kept verbatim, so `MYAPP__Server__Port` binds `Server:Port`.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_pairs(
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Vec<(String, String)> {
    let needle = format!("{prefix}{ENV_SEPARATOR}");

    vars.into_iter()
        .filter_map(|(name, value)| {
            let rest = name.strip_prefix(&needle)?;
            let key = rest
                .split(ENV_SEPARATOR)
                .try_fold(String::new(), |key, segment| {
                    (!segment.is_empty()).then(|| child_key(&key, segment))
                })?;
            debug_assert!(!key.starts_with(KEY_DELIMITER));
            Some((key, value))
        })
        .collect()
}
