//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with request ID flowing through all subsystems
//! - Metrics are cheap (atomic increments)
//! - Rejection counters are labeled by reason, never by client content

pub mod logging;
pub mod metrics;
