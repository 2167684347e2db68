//! Response construction.
//!
//! # Responsibilities
//! - Render gate rejections as `{"error": ...}` JSON bodies
//! - Keep error bodies under the error-body size profile
//!
//! # Design Decisions
//! - Error bodies pass through the same serializer checks as anything else
//!   the gateway emits; a failure there degrades to a static 500 instead of
//!   panicking the request task

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::json;

use crate::gate::Rejection;
use crate::security::limits;
use crate::validation::serialize_checked;

/// Render a gate rejection as its terminal response.
pub fn rejection_response(rejection: &Rejection) -> Response {
    error_response(rejection.status, &rejection.message)
}

/// Build a `{"error": ...}` response with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let payload = json!({ "error": message });
    match serialize_checked(&payload, &limits::error_body()) {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(error) => {
            tracing::error!(error = %error, "Failed to serialize error body");
            let mut response = Response::new(Body::from("Internal error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_body_has_expected_shape() {
        let response = error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"], "Request body too large");
    }
}
