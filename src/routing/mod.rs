//! Request applicability subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → scope.rs (guarded or exempt decision)
//!     → matcher.rs (evaluate individual conditions)
//!     → Return: Guarded (full check sequence) or Exempt (headers only)
//!
//! Scope Compilation (at startup / reload):
//!     ScopeConfig
//!     → Compile matchers (prefixes, exact paths, extensions)
//!     → Freeze as immutable GateScope
//! ```
//!
//! # Design Decisions
//! - Scope compiled from config, immutable at runtime, swapped on reload
//! - No regex in hot path (prefix and suffix matching only)
//! - Exemptions are checked before the protected include-set
//! - Deterministic: same path always gets same decision

pub mod matcher;
pub mod scope;

pub use matcher::Matcher;
pub use scope::GateScope;
