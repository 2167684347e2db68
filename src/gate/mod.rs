//! Gate orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → scope decision (guarded / exempt)
//!     → rate check (429 on saturation)
//!     → declared-size check (413, body never read)
//!     → body read under deadline + byte cap
//!     → structural validation (400 on any violation)
//!     → Forward (body re-materialized) or Reject (typed rejection)
//! ```
//!
//! # Design Decisions
//! - Checks ordered cheapest-first; the first failure short-circuits
//! - Policy (scope, limits, rate settings) swaps atomically on reload;
//!   the limiter's counter table survives reloads untouched
//! - An aborted or rejected request keeps its rate-limit charge

pub mod keeper;

pub use keeper::{GateDecision, GatePolicy, Gatekeeper, RejectKind, Rejection};
