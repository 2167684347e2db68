//! Structural payload validation subsystem.
//!
//! # Data Flow
//! ```text
//! Raw body bytes
//!     → structural.rs (byte cap → parse → depth check → scalar check)
//!     → Accepted: parsed value handed back to the gate
//!     → Rejected: typed error with a short, user-safe message
//! ```
//!
//! # Design Decisions
//! - Cheapest rejection first: byte length before parse, parse before traversal
//! - Traversal uses an explicit work-stack, never native recursion
//! - Error messages carry no internal state, only the violated bound

pub mod structural;

pub use structural::{parse_checked, serialize_checked, ValidationError, ValidationLimits};
