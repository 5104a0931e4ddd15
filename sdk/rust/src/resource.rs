//! Resource path normalization.
//!
//! Backend routes are registered with trailing slashes, so every path the
//! client sends must end in exactly one. Callers pass logical resource names
//! (`"dogs"`, `"dogs/12"`, `"/api/litters/"`) and get back a root-relative path.
//!
//! The result always starts with the API root. Dot segments (`.`, `..`, and
//! their percent-encoded forms) are dropped and a `#fragment` is cut off, so
//! URL resolution cannot move a request outside the root or strip its
//! trailing slash.

/// API root used when no other root is configured.
pub const DEFAULT_API_ROOT: &str = "/api";

/// Format a resource path under the default API root.
///
/// ```
/// use kennel_api::format_api_url;
///
/// assert_eq!(format_api_url("dogs"), "/api/dogs/");
/// assert_eq!(format_api_url("dogs/"), "/api/dogs/");
/// assert_eq!(format_api_url("dogs?sex=F"), "/api/dogs/?sex=F");
/// ```
pub fn format_api_url(resource_path: &str) -> String {
    format_with_root(DEFAULT_API_ROOT, resource_path)
}

/// Format a resource path under `api_root`.
pub fn format_with_root(api_root: &str, resource_path: &str) -> String {
    let root = segments(api_root);

    // Fragments never reach the server.
    let trimmed = match resource_path.trim().split_once('#') {
        Some((before, _)) => before,
        None => resource_path.trim(),
    };

    let (path, query) = match trimmed.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (trimmed, None),
    };

    let mut rest = segments(path);
    // Callers sometimes pass the root themselves; do not nest it twice.
    if !root.is_empty() && rest.len() >= root.len() && rest[..root.len()] == root[..] {
        rest.drain(..root.len());
    }

    let mut url = String::from("/");
    for segment in root.iter().chain(rest.iter()) {
        url.push_str(segment);
        url.push('/');
    }

    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(q);
    }

    url
}

/// Non-empty path segments, without dot segments.
///
/// Backslashes count as separators because URL parsing treats them as `/`
/// for http(s).
fn segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_dot_segment(s))
        .collect()
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}
