//! Request gatekeeping: the forward-or-reject decision.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};

use crate::config::{GatewayConfig, RateLimitConfig};
use crate::routing::GateScope;
use crate::security::limits;
use crate::security::rate_limit::{RateDecision, RateLimiter};
use crate::validation::{parse_checked, ValidationError, ValidationLimits};

/// Terminal decision for one request.
pub enum GateDecision {
    /// Pass the request to the upstream, body re-materialized if it was read.
    Forward(Request<Body>),
    /// Short-circuit with a terminal error response.
    Reject(Rejection),
}

/// Why a request was rejected. Used as the metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    RateLimited,
    DeclaredSizeExceeded,
    PayloadTooLarge,
    TooDeeplyNested,
    ScalarTooLong,
    Malformed,
    BodyTimeout,
    BodyUnreadable,
}

impl RejectKind {
    pub fn label(self) -> &'static str {
        match self {
            RejectKind::RateLimited => "rate_limited",
            RejectKind::DeclaredSizeExceeded => "declared_size_exceeded",
            RejectKind::PayloadTooLarge => "payload_too_large",
            RejectKind::TooDeeplyNested => "too_deeply_nested",
            RejectKind::ScalarTooLong => "scalar_too_long",
            RejectKind::Malformed => "malformed",
            RejectKind::BodyTimeout => "body_timeout",
            RejectKind::BodyUnreadable => "body_unreadable",
        }
    }
}

/// A terminal, user-visible rejection.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub status: StatusCode,
    pub kind: RejectKind,
    pub message: String,
}

impl Rejection {
    fn rate_limited() -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            kind: RejectKind::RateLimited,
            message: "Too many requests. Please try again later.".to_string(),
        }
    }

    fn declared_size_exceeded() -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            kind: RejectKind::DeclaredSizeExceeded,
            message: "Request body too large".to_string(),
        }
    }

    fn body_timeout() -> Self {
        Self {
            status: StatusCode::REQUEST_TIMEOUT,
            kind: RejectKind::BodyTimeout,
            message: "Request body read timed out".to_string(),
        }
    }

    fn body_unreadable() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: RejectKind::BodyUnreadable,
            message: "Failed to read request body".to_string(),
        }
    }
}

impl From<ValidationError> for Rejection {
    fn from(error: ValidationError) -> Self {
        let kind = match error {
            ValidationError::PayloadTooLarge { .. } => RejectKind::PayloadTooLarge,
            ValidationError::TooDeeplyNested { .. } => RejectKind::TooDeeplyNested,
            ValidationError::ScalarTooLong { .. } => RejectKind::ScalarTooLong,
            ValidationError::Malformed(_) => RejectKind::Malformed,
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            kind,
            message: error.to_string(),
        }
    }
}

/// Everything the gate needs to judge a request.
///
/// Rebuilt from configuration on reload and swapped atomically.
pub struct GatePolicy {
    pub scope: GateScope,
    pub request_limits: ValidationLimits,
    pub rate: RateLimitConfig,
    pub body_read_timeout: Duration,
}

impl GatePolicy {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            scope: GateScope::from_config(&config.scope),
            request_limits: limits::request_body(&config.limits),
            rate: config.rate_limit,
            body_read_timeout: Duration::from_secs(config.timeouts.body_read_secs),
        }
    }
}

/// Orchestrates the check sequence for every inbound request.
///
/// The limiter store is injected so tests can use an isolated store and a
/// fake clock; the policy is hot-swappable without touching the store.
pub struct Gatekeeper {
    policy: ArcSwap<GatePolicy>,
    limiter: Arc<RateLimiter>,
}

impl Gatekeeper {
    pub fn new(policy: GatePolicy, limiter: Arc<RateLimiter>) -> Self {
        Self {
            policy: ArcSwap::from_pointee(policy),
            limiter,
        }
    }

    pub fn from_config(config: &GatewayConfig, limiter: Arc<RateLimiter>) -> Self {
        Self::new(GatePolicy::from_config(config), limiter)
    }

    /// Swap in a new policy. In-flight requests finish under the old one.
    pub fn reload(&self, policy: GatePolicy) {
        self.policy.store(Arc::new(policy));
    }

    /// Run the check sequence for one request.
    ///
    /// Any rejection short-circuits the remaining steps. Exempt paths skip
    /// every check; the protective headers are applied by the HTTP layer
    /// in both cases.
    pub async fn handle(&self, request: Request<Body>, client_id: &str) -> GateDecision {
        // Owned snapshot: the policy must survive the body-read await and
        // stay Send for the runtime.
        let policy = self.policy.load_full();

        let guarded = policy.scope.is_guarded(request.uri().path());
        if !guarded {
            return GateDecision::Forward(request);
        }

        if self.limiter.check(client_id, Instant::now(), &policy.rate) == RateDecision::Reject {
            tracing::warn!(
                client = %client_id,
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            return GateDecision::Reject(Rejection::rate_limited());
        }

        if let Some(declared) = declared_content_length(request.headers()) {
            if declared > policy.request_limits.max_payload_bytes {
                tracing::warn!(
                    client = %client_id,
                    declared,
                    limit = policy.request_limits.max_payload_bytes,
                    "Declared content length over limit"
                );
                return GateDecision::Reject(Rejection::declared_size_exceeded());
            }
        }

        if !(carries_body(request.method()) && is_structured_content(request.headers())) {
            return GateDecision::Forward(request);
        }

        let (parts, body) = request.into_parts();

        // One byte past the limit, so an over-cap body reaches the
        // validator's byte-length check instead of being silently truncated.
        let cap = policy.request_limits.max_payload_bytes.saturating_add(1);
        let read = tokio::time::timeout(policy.body_read_timeout, axum::body::to_bytes(body, cap));
        let bytes = match read.await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(_)) => return GateDecision::Reject(Rejection::body_unreadable()),
            Err(_) => {
                tracing::warn!(client = %client_id, "Timed out reading request body");
                return GateDecision::Reject(Rejection::body_timeout());
            }
        };

        if !bytes.is_empty() {
            if let Err(error) = parse_checked(&bytes, &policy.request_limits) {
                tracing::warn!(
                    client = %client_id,
                    path = %parts.uri.path(),
                    error = %error,
                    "Request payload rejected"
                );
                return GateDecision::Reject(Rejection::from(error));
            }
        }

        GateDecision::Forward(Request::from_parts(parts, Body::from(bytes)))
    }
}

fn declared_content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn is_structured_content(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_lowercase().contains("application/json"))
        .unwrap_or(false)
}
