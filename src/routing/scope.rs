//! Guarded-or-exempt decision for request paths.
//!
//! # Responsibilities
//! - Compile the scope configuration into matcher lists
//! - Decide whether a request is subject to the full check sequence
//!
//! # Design Decisions
//! - Exemptions win over everything else: static assets and framework
//!   internals are never rate-limited or body-checked
//! - Paths carrying a server-component payload marker are guarded even
//!   when they sit outside the protected prefixes
//! - Exempt requests still receive the protective response headers; the
//!   scope only controls the check sequence

use crate::config::ScopeConfig;
use crate::routing::matcher::{
    ExactPathMatcher, ExtensionMatcher, Matcher, PathPrefixMatcher, SubstringMatcher,
};

/// Compiled applicability scope.
///
/// Immutable after construction; rebuilt and swapped on config reload.
#[derive(Debug)]
pub struct GateScope {
    exempt: Vec<Box<dyn Matcher>>,
    protected: Vec<Box<dyn Matcher>>,
    markers: Vec<Box<dyn Matcher>>,
}

impl GateScope {
    /// Compile a scope from configuration.
    pub fn from_config(config: &ScopeConfig) -> Self {
        let mut exempt: Vec<Box<dyn Matcher>> = Vec::new();
        for prefix in &config.exempt_prefixes {
            exempt.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
        }
        for path in &config.exempt_paths {
            exempt.push(Box::new(ExactPathMatcher::new(path.clone())));
        }
        for extension in &config.exempt_extensions {
            exempt.push(Box::new(ExtensionMatcher::new(extension.clone())));
        }

        let protected = config
            .protected_prefixes
            .iter()
            .map(|prefix| Box::new(PathPrefixMatcher::new(prefix.clone())) as Box<dyn Matcher>)
            .collect();

        let markers = config
            .guarded_markers
            .iter()
            .map(|marker| Box::new(SubstringMatcher::new(marker.clone())) as Box<dyn Matcher>)
            .collect();

        Self {
            exempt,
            protected,
            markers,
        }
    }

    /// Whether a path is subject to the full check sequence.
    pub fn is_guarded(&self, path: &str) -> bool {
        if self.exempt.iter().any(|m| m.matches(path)) {
            return false;
        }
        if self.protected.iter().any(|m| m.matches(path)) {
            return true;
        }
        self.markers.iter().any(|m| m.matches(path))
    }
}
