//! Path matching logic.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive)
//! - Match exact paths
//! - Match file extensions (case-insensitive)
//! - Match path substrings
//!
//! # Design Decisions
//! - Path matching is case-sensitive; extensions are not
//! - No regex to guarantee O(n) matching

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches a request path prefix.
#[derive(Debug, Clone)]
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
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches an exact request path.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, path: &str) -> bool {
        path == self.path
    }
}

/// Matches a file extension at the end of the path.
///
/// The extension is normalized to lowercase for case-insensitive matching.
#[derive(Debug, Clone)]
pub struct ExtensionMatcher {
    suffix: String,
}

impl ExtensionMatcher {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            suffix: format!(".{}", extension.into().to_lowercase()),
        }
    }
}

impl Matcher for ExtensionMatcher {
    fn matches(&self, path: &str) -> bool {
        path.to_lowercase().ends_with(&self.suffix)
    }
}

/// Matches a substring anywhere in the path.
#[derive(Debug, Clone)]
pub struct SubstringMatcher {
    needle: String,
}

impl SubstringMatcher {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

impl Matcher for SubstringMatcher {
    fn matches(&self, path: &str) -> bool {
        path.contains(&self.needle)
    }
}
