use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static UPPERCASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("[A-Z]").expect("Uppercase regex pattern should be valid")
});

/// Canonical (lowercase) form of a request path.
///
/// The hosting layer answers any path containing an uppercase letter with a
/// redirect to its lowercase form; building URLs from the canonical path
/// avoids that round trip. Paths already in canonical form are borrowed.
pub fn canonical_path(path: &str) -> Cow<'_, str> {
    if UPPERCASE.is_match(path) {
        Cow::Owned(path.to_lowercase())
    } else {
        Cow::Borrowed(path)
    }
}

/// Join a route prefix and a path segment without doubling slashes
pub fn join_route(prefix: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}
