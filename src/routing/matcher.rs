//! Path prefix matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Plain `starts_with`: `/api` also claims `/apiary`
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Length used to rank overlapping prefixes; longer is more specific.
    pub fn specificity(&self) -> usize {
        self.prefix.len()
    }

    pub fn matches_path(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}
