use std::path::{Path, PathBuf};

use url::{Url, form_urlencoded};

/// Join two paths, only including the normal components.
pub fn join_normalized(base: impl AsRef<Path>, path: impl AsRef<Path>) -> PathBuf {
    let mut out = base.as_ref().to_path_buf();
    out.extend(path.as_ref().components().filter(|v| matches!(v, std::path::Component::Normal(_))));
    out
}

/// Truncate a string to at most `max` characters, appending an ellipsis when shortened.
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", value[..idx].trim_end()),
        None => value.to_string(),
    }
}

/// Concatenate a deployment base URL with a root-relative path,
/// e.g. `https://example.com/` + `/api/og?x=y`.
pub fn absolute_url(base: &Url, path_and_query: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path_and_query)
}

/// First value of each of `keys` in a URL-encoded query string.
/// Later duplicates are ignored and malformed input never fails.
pub fn query_values<const N: usize>(query: Option<&str>, keys: [&str; N]) -> [Option<String>; N] {
    let mut values = [const { None }; N];
    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        if let Some(idx) = keys.iter().position(|k| *k == key)
            && values[idx].is_none()
        {
            values[idx] = Some(value.into_owned());
        }
    }
    values
}
