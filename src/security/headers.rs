//! Protective response headers.
//!
//! # Responsibilities
//! - Attach the baseline protective headers to every outgoing response
//!
//! # Design Decisions
//! - Applied unconditionally: forwarded, rejected, and passthrough
//!   responses all carry them
//! - Insert (not append) so an upstream cannot smuggle weaker values past
//!   the gateway

use axum::http::{header, HeaderMap, HeaderValue};

/// Apply the protective header set to a response header map.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_all_protective_headers() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers);

        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("x-xss-protection").unwrap(), "1; mode=block");
        assert_eq!(
            headers.get("referrer-policy").unwrap(),
            "strict-origin-when-cross-origin"
        );
    }

    #[test]
    fn overwrites_existing_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("ALLOWALL"));
        apply_security_headers(&mut headers);
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    }
}
