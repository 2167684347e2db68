//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, windows > 0)
//! - Check addresses parse before the server tries to bind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted config field the error refers to.
    pub field: String,
    /// Human-readable problem description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err("listener.bind_address", "not a valid socket address"));
    }
    if config.upstream.address.parse::<SocketAddr>().is_err() {
        errors.push(err("upstream.address", "not a valid socket address"));
    }

    if config.limits.max_payload_bytes == 0 {
        errors.push(err("limits.max_payload_bytes", "must be greater than zero"));
    }
    if config.limits.max_nesting_depth == 0 {
        errors.push(err("limits.max_nesting_depth", "must be greater than zero"));
    }
    if config.limits.max_scalar_length == 0 {
        errors.push(err("limits.max_scalar_length", "must be greater than zero"));
    }

    if config.rate_limit.window_ms == 0 {
        errors.push(err("rate_limit.window_ms", "must be greater than zero"));
    }
    if config.rate_limit.max_requests == 0 {
        errors.push(err("rate_limit.max_requests", "must be greater than zero"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be greater than zero"));
    }
    if config.timeouts.body_read_secs == 0 {
        errors.push(err("timeouts.body_read_secs", "must be greater than zero"));
    }

    for prefix in config
        .scope
        .protected_prefixes
        .iter()
        .chain(&config.scope.exempt_prefixes)
    {
        if !prefix.starts_with('/') {
            errors.push(err("scope", format!("prefix '{}' must start with '/'", prefix)));
        }
    }
    for path in &config.scope.exempt_paths {
        if !path.starts_with('/') {
            errors.push(err("scope.exempt_paths", format!("path '{}' must start with '/'", path)));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(err("observability.metrics_address", "not a valid socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
