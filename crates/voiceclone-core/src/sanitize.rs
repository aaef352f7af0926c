//! Canonical, filesystem-safe names for voice samples

/// Extension every voice sample is stored under
pub const SAMPLE_EXTENSION: &str = "wav";

/// Map an arbitrary title or user-supplied name to a sample filename.
///
/// Drops any existing extension, replaces everything outside `[a-zA-Z0-9]`
/// with `_`, lower-cases, collapses `_` runs, trims `_` at both ends and
/// appends `.wav`.
///
/// A name with no alphanumeric characters at all maps to the bare `".wav"`.
pub fn sanitize(name: &str) -> String {
    format!("{}.{}", sanitize_stem(name), SAMPLE_EXTENSION)
}

/// [`sanitize`] without the trailing extension.
pub fn sanitize_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in strip_extension(name).chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    stem.trim_matches('_').to_string()
}

/// Path-style extension stripping: only the last `.` of the final component
/// counts, and leading dots (hidden files) never start an extension.
fn strip_extension(name: &str) -> &str {
    let component_start = name.rfind(|c: char| c == '/' || c == '\\').map_or(0, |i| i + 1);
    let Some(dot) = name.rfind('.') else {
        return name;
    };
    if dot <= component_start {
        return name;
    }
    if name[component_start..dot].chars().all(|c| c == '.') {
        return name;
    }
    &name[..dot]
}
