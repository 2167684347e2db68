//! Payload limit profiles.
//!
//! # Responsibilities
//! - Bind configured limits to the validator's `ValidationLimits`
//! - Provide tighter profiles for smaller payload classes
//!
//! # Design Decisions
//! - Limits are chosen per call site, not globally
//! - The gateway's own error bodies use a much smaller byte cap than
//!   request bodies; an error response never needs a megabyte

use crate::config::LimitsConfig;
use crate::validation::ValidationLimits;

/// Byte cap for gateway-produced error bodies.
const ERROR_BODY_MAX_BYTES: usize = 16 * 1024;

/// Limits for inbound request bodies, from configuration.
pub fn request_body(config: &LimitsConfig) -> ValidationLimits {
    ValidationLimits {
        max_payload_bytes: config.max_payload_bytes,
        max_nesting_depth: config.max_nesting_depth,
        max_scalar_length: config.max_scalar_length,
    }
}

/// Limits for the gateway's own error response bodies.
pub fn error_body() -> ValidationLimits {
    ValidationLimits {
        max_payload_bytes: ERROR_BODY_MAX_BYTES,
        ..ValidationLimits::default()
    }
}
