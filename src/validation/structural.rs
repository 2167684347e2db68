//! Bounded parsing and validation of structured payloads.
//!
//! # Responsibilities
//! - Reject oversized payloads before any parsing happens
//! - Reject structures nested past the configured depth
//! - Reject individual string scalars past the configured length
//! - Symmetric size check when serializing gateway-produced bodies
//!
//! # Design Decisions
//! - Checks ordered by cost: byte length, then parse, then traversal
//! - Depth traversal descends at most one level past the limit per branch,
//!   so hostile input cannot buy unbounded CPU or stack
//! - Explicit work-stack instead of recursion: logical depth is bounded by
//!   the check itself, not by the thread's stack size

use serde_json::Value;
use thiserror::Error;

/// Limits applied to one validation call.
///
/// Supplied per call site; smaller payload classes use tighter profiles
/// (see `security::limits`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    /// Maximum serialized size in bytes.
    pub max_payload_bytes: usize,
    /// Maximum nesting depth of containers.
    pub max_nesting_depth: usize,
    /// Maximum length of a single string scalar, in characters.
    pub max_scalar_length: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_payload_bytes: 1024 * 1024,
            max_nesting_depth: 32,
            max_scalar_length: 100_000,
        }
    }
}

/// A structural validation failure.
///
/// Messages are short and user-safe; they name the violated bound and
/// nothing else.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Payload exceeds maximum size of {limit} bytes (got {size} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Payload too deeply nested (depth: {depth}, max: {limit})")]
    TooDeeplyNested { depth: usize, limit: usize },

    #[error("String at path \"{path}\" exceeds maximum length of {limit}")]
    ScalarTooLong { path: String, limit: usize },

    #[error("Invalid payload: {0}")]
    Malformed(String),
}

/// Parse raw bytes into a structured value, enforcing all limits.
///
/// Check order: byte length (parsing never begins for oversized input),
/// parse, nesting depth, scalar lengths.
pub fn parse_checked(raw: &[u8], limits: &ValidationLimits) -> Result<Value, ValidationError> {
    if raw.len() > limits.max_payload_bytes {
        return Err(ValidationError::PayloadTooLarge {
            size: raw.len(),
            limit: limits.max_payload_bytes,
        });
    }

    let parsed: Value = serde_json::from_slice(raw)
        .map_err(|e| ValidationError::Malformed(e.to_string()))?;

    let depth = structure_depth(&parsed, limits.max_nesting_depth);
    if depth > limits.max_nesting_depth {
        return Err(ValidationError::TooDeeplyNested {
            depth,
            limit: limits.max_nesting_depth,
        });
    }

    check_scalar_lengths(&parsed, limits.max_scalar_length)?;

    Ok(parsed)
}

/// Serialize a value, rejecting results over the byte cap.
pub fn serialize_checked(value: &Value, limits: &ValidationLimits) -> Result<Vec<u8>, ValidationError> {
    let bytes = serde_json::to_vec(value).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    if bytes.len() > limits.max_payload_bytes {
        return Err(ValidationError::PayloadTooLarge {
            size: bytes.len(),
            limit: limits.max_payload_bytes,
        });
    }
    Ok(bytes)
}

/// Maximum nesting depth of a value, capped at `limit + 1`.
///
/// A scalar root has depth 0; each container level adds one. Any branch
/// reaching `limit + 1` ends the walk immediately: the value is already
/// known to violate the limit, and exploring further is exactly the
/// wasted work an attacker would be buying.
fn structure_depth(root: &Value, limit: usize) -> usize {
    let mut max_depth = 0;
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];

    while let Some((value, depth)) = stack.pop() {
        if depth > max_depth {
            max_depth = depth;
        }
        if depth > limit {
            return depth;
        }
        match value {
            Value::Array(items) => {
                for item in items {
                    stack.push((item, depth + 1));
                }
            }
            Value::Object(map) => {
                for item in map.values() {
                    stack.push((item, depth + 1));
                }
            }
            _ => {}
        }
    }

    max_depth
}

/// Walk every string scalar, rejecting any over `limit` characters.
///
/// The locator path uses dotted keys and bracketed indices ("a.b[2].c")
/// so the client can find the offending field.
fn check_scalar_lengths(root: &Value, limit: usize) -> Result<(), ValidationError> {
    let mut stack: Vec<(&Value, String)> = vec![(root, String::new())];

    while let Some((value, path)) = stack.pop() {
        match value {
            Value::String(s) => {
                if s.chars().count() > limit {
                    return Err(ValidationError::ScalarTooLong { path, limit });
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    stack.push((item, format!("{}[{}]", path, index)));
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    let child = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    stack.push((item, child));
                }
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits(bytes: usize, depth: usize, scalar: usize) -> ValidationLimits {
        ValidationLimits {
            max_payload_bytes: bytes,
            max_nesting_depth: depth,
            max_scalar_length: scalar,
        }
    }

    /// Build `{"k":{"k":{...}}}` with `levels` nested objects.
    fn nested_object(levels: usize) -> String {
        let mut s = String::new();
        for _ in 0..levels {
            s.push_str("{\"k\":");
        }
        s.push('1');
        for _ in 0..levels {
            s.push('}');
        }
        s
    }

    #[test]
    fn accepts_payload_at_depth_limit() {
        let raw = nested_object(8);
        assert!(parse_checked(raw.as_bytes(), &limits(1024, 8, 100)).is_ok());
    }

    #[test]
    fn rejects_payload_one_past_depth_limit() {
        let raw = nested_object(9);
        match parse_checked(raw.as_bytes(), &limits(1024, 8, 100)) {
            Err(ValidationError::TooDeeplyNested { depth, limit }) => {
                assert_eq!(depth, 9);
                assert_eq!(limit, 8);
            }
            other => panic!("expected TooDeeplyNested, got {:?}", other),
        }
    }

    #[test]
    fn reported_depth_is_capped_for_very_deep_input() {
        let raw = nested_object(50);
        match parse_checked(raw.as_bytes(), &limits(4096, 8, 100)) {
            Err(ValidationError::TooDeeplyNested { depth, .. }) => {
                // Short-circuits one level past the limit instead of
                // walking the whole branch.
                assert_eq!(depth, 9);
            }
            other => panic!("expected TooDeeplyNested, got {:?}", other),
        }
    }

    #[test]
    fn empty_containers_do_not_add_depth() {
        let value = json!({"a": {}, "b": []});
        let raw = serde_json::to_vec(&value).unwrap();
        assert!(parse_checked(&raw, &limits(1024, 1, 100)).is_ok());
    }

    #[test]
    fn wide_but_shallow_payload_is_accepted() {
        let items: Vec<u32> = (0..1000).collect();
        let raw = serde_json::to_vec(&json!({ "items": items })).unwrap();
        assert!(parse_checked(&raw, &limits(64 * 1024, 2, 100)).is_ok());
    }

    #[test]
    fn byte_cap_applies_before_parsing() {
        // Not valid JSON, but the size check must fire first.
        let raw = vec![b'x'; 2048];
        match parse_checked(&raw, &limits(1024, 8, 100)) {
            Err(ValidationError::PayloadTooLarge { size, limit }) => {
                assert_eq!(size, 2048);
                assert_eq!(limit, 1024);
            }
            other => panic!("expected PayloadTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn malformed_input_is_rejected_with_parser_message() {
        let result = parse_checked(b"{\"a\":", &limits(1024, 8, 100));
        assert!(matches!(result, Err(ValidationError::Malformed(_))));
    }

    #[test]
    fn scalar_at_limit_is_accepted() {
        let raw = serde_json::to_vec(&json!({ "s": "x".repeat(10) })).unwrap();
        assert!(parse_checked(&raw, &limits(1024, 8, 10)).is_ok());
    }

    #[test]
    fn oversized_scalar_reports_its_path() {
        let value = json!({"a": {"b": [1, {"c": "x".repeat(11)}]}});
        let raw = serde_json::to_vec(&value).unwrap();
        match parse_checked(&raw, &limits(1024, 8, 10)) {
            Err(ValidationError::ScalarTooLong { path, limit }) => {
                assert_eq!(path, "a.b[1].c");
                assert_eq!(limit, 10);
            }
            other => panic!("expected ScalarTooLong, got {:?}", other),
        }
    }

    #[test]
    fn oversized_scalar_in_root_array_reports_index() {
        let raw = serde_json::to_vec(&json!(["ok", "x".repeat(11)])).unwrap();
        match parse_checked(&raw, &limits(1024, 8, 10)) {
            Err(ValidationError::ScalarTooLong { path, .. }) => assert_eq!(path, "[1]"),
            other => panic!("expected ScalarTooLong, got {:?}", other),
        }
    }

    #[test]
    fn pathological_depth_is_rejected_without_exhausting_the_stack() {
        // Deep enough to overflow a native recursive walk; the parser's own
        // recursion limit turns this into a Malformed rejection and the
        // work-stack keeps the depth check safe for anything that parses.
        let mut raw = String::new();
        for _ in 0..100_000 {
            raw.push('[');
        }
        assert!(parse_checked(raw.as_bytes(), &limits(1024 * 1024, 32, 100)).is_err());
    }

    #[test]
    fn serialize_rejects_over_cap() {
        let value = json!({ "s": "x".repeat(64) });
        match serialize_checked(&value, &limits(16, 8, 1024)) {
            Err(ValidationError::PayloadTooLarge { .. }) => {}
            other => panic!("expected PayloadTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn serialize_passes_under_cap() {
        let value = json!({ "error": "Request body too large" });
        let bytes = serialize_checked(&value, &limits(1024, 8, 1024)).unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), value);
    }

    #[test]
    fn scalar_length_counts_characters_not_bytes() {
        // Multibyte characters: 6 chars, 12 bytes.
        let raw = serde_json::to_vec(&json!({ "s": "éééééé" })).unwrap();
        assert!(parse_checked(&raw, &limits(1024, 8, 6)).is_ok());
    }
}
