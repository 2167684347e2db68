//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream application server the gateway forwards to.
    pub upstream: UpstreamConfig,

    /// Which paths are guarded and which bypass the checks.
    pub scope: ScopeConfig,

    /// Structural payload limits.
    pub limits: LimitsConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream application server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Path applicability configuration.
///
/// Exempt entries are checked before the protected include-set, so a path
/// can never be both. Exempt paths skip the rate/size/structure checks but
/// still receive the protective response headers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Path prefixes subject to the full check sequence.
    pub protected_prefixes: Vec<String>,

    /// Path prefixes that bypass the checks (static assets, framework internals).
    pub exempt_prefixes: Vec<String>,

    /// Exact paths that bypass the checks.
    pub exempt_paths: Vec<String>,

    /// File extensions that bypass the checks (without the leading dot).
    pub exempt_extensions: Vec<String>,

    /// Substrings that re-guard an otherwise exempt prefix
    /// (e.g., server-component payload endpoints under "/_next").
    pub guarded_markers: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: vec!["/app".to_string(), "/api".to_string()],
            exempt_prefixes: vec!["/_next/static".to_string(), "/_next/image".to_string()],
            exempt_paths: vec!["/favicon.ico".to_string()],
            exempt_extensions: vec![
                "svg".to_string(),
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "webp".to_string(),
            ],
            guarded_markers: vec!["rsc".to_string()],
        }
    }
}

/// Structural payload limits.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request payload size in bytes.
    pub max_payload_bytes: usize,

    /// Maximum nesting depth of a structured payload.
    pub max_nesting_depth: usize,

    /// Maximum length of a single string scalar, in characters.
    pub max_scalar_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 1024 * 1024,
            max_nesting_depth: 32,
            max_scalar_length: 100_000,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Window duration in milliseconds.
    pub window_ms: u64,

    /// Maximum requests admitted per client per window.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            max_requests: 100,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Deadline for reading a request body, in seconds.
    pub body_read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            body_read_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
