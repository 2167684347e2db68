//! Request-Validation and Rate-Limiting Gateway Library

pub mod config;
pub mod gate;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod validation;

pub use config::schema::GatewayConfig;
pub use gate::{GateDecision, Gatekeeper};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::rate_limit::RateLimiter;
pub use validation::structural::{parse_checked, serialize_checked, ValidationError};
