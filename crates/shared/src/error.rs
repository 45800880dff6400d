//! API error envelope and message extraction.
//!
//! The backend answers failed `/api/*` calls with a ProblemDetails-shaped
//! body whose `errors` member carries field-level validation messages.
//! [`extract_error_message`] turns any of the shapes the backend is known
//! to produce into a single human-readable string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shown when a response body carries nothing usable.
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

/// ProblemDetails (application/problem+json) with the validation
/// `errors` map the backend attaches on 400s. [`extract_error_message`]
/// parses this shape first and falls back to an untyped scan for
/// bodies that do not quite conform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Error type for client-side API calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("deserialization error: {0}")]
    Deserialize(String),
}

impl ApiError {
    /// Human-readable message suitable for inline display.
    ///
    /// Authorization failures are worded as a sign-in prompt rather
    /// than an HTTP code; everything else goes through
    /// [`message_from_body`].
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Http { status: 401, .. } | ApiError::Http { status: 403, .. } => {
                "Please sign in to continue.".to_string()
            }
            ApiError::Http { body, .. } => message_from_body(body),
            ApiError::Deserialize(_) => GENERIC_ERROR.to_string(),
        }
    }
}

/// Extract a message from a raw response body. A body that is not JSON
/// at all is treated as a plain-text payload and returned verbatim.
pub fn message_from_body(body: &str) -> String {
    if body.trim().is_empty() {
        return GENERIC_ERROR.to_string();
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => extract_error_message(&value),
        Err(_) => body.to_string(),
    }
}

/// Flatten an error payload into one message.
///
/// Resolution order:
/// 1. a bare string payload is returned verbatim;
/// 2. a non-empty `errors` object (field -> string | [string]) is
///    flattened and joined with `". "` — the canonical
///    [`ProblemDetails`] shape takes the typed path, looser shapes
///    are scanned untyped;
/// 3. the payload's own keys (minus the ProblemDetails envelope keys)
///    are scanned for the same field-message shape;
/// 4. `title`, `message`, `data.message`, `error.message`, in that
///    order, else [`GENERIC_ERROR`].
pub fn extract_error_message(payload: &Value) -> String {
    if let Value::String(s) = payload {
        return s.clone();
    }

    // Canonical problem+json: field errors arrive as string arrays.
    if let Ok(details) = ProblemDetails::deserialize(payload) {
        let flat: Vec<String> = details.errors.into_values().flatten().collect();
        if !flat.is_empty() {
            return flat.join(". ");
        }
    }

    // Looser shapes: `errors` values may be bare strings.
    if let Some(errors) = payload.get("errors").and_then(Value::as_object) {
        let flat = flatten_field_errors(errors.iter());
        if !flat.is_empty() {
            return flat.join(". ");
        }
    }

    if let Some(obj) = payload.as_object() {
        const ENVELOPE_KEYS: [&str; 5] = ["type", "title", "status", "traceId", "errors"];
        let flat = flatten_field_errors(
            obj.iter()
                .filter(|(key, _)| !ENVELOPE_KEYS.contains(&key.as_str())),
        );
        if !flat.is_empty() {
            return flat.join(". ");
        }
    }

    for path in [&["title"][..], &["message"], &["data", "message"], &["error", "message"]] {
        let mut cursor = payload;
        let mut found = true;
        for key in path {
            match cursor.get(key) {
                Some(next) => cursor = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if found {
            if let Some(s) = cursor.as_str() {
                if !s.is_empty() {
                    return s.to_string();
                }
            }
        }
    }

    GENERIC_ERROR.to_string()
}

/// Collect every string from `field -> string | [string]` entries.
fn flatten_field_errors<'a>(
    entries: impl Iterator<Item = (&'a String, &'a Value)>,
) -> Vec<String> {
    let mut out = Vec::new();
    for (_, value) in entries {
        match value {
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => {
                out.extend(items.iter().filter_map(Value::as_str).map(str::to_string));
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_payload_is_verbatim() {
        assert_eq!(message_from_body("\"plain text\""), "plain text");
        // Not JSON at all: still treated as a plain-text payload.
        assert_eq!(message_from_body("plain text"), "plain text");
    }

    #[test]
    fn errors_map_is_flattened_and_joined() {
        let payload = json!({"errors": {"email": ["required"], "name": ["too short"]}});
        assert_eq!(extract_error_message(&payload), "required. too short");
    }

    #[test]
    fn mixed_string_and_array_values_flatten() {
        let payload = json!({"errors": {"email": "required", "name": ["too short", "invalid"]}});
        assert_eq!(
            extract_error_message(&payload),
            "required. too short. invalid"
        );
    }

    #[test]
    fn top_level_field_errors_outside_envelope_keys() {
        let payload = json!({
            "type": "https://example.test/validation",
            "status": 400,
            "traceId": "00-abc",
            "password": ["too weak"]
        });
        assert_eq!(extract_error_message(&payload), "too weak");
    }

    #[test]
    fn title_fallback() {
        let payload = json!({"title": "Bad Request"});
        assert_eq!(extract_error_message(&payload), "Bad Request");
    }

    #[test]
    fn nested_message_fallbacks() {
        assert_eq!(
            extract_error_message(&json!({"data": {"message": "nested"}})),
            "nested"
        );
        assert_eq!(
            extract_error_message(&json!({"error": {"message": "inner"}})),
            "inner"
        );
    }

    #[test]
    fn empty_payload_yields_generic_fallback() {
        assert_eq!(extract_error_message(&json!({})), GENERIC_ERROR);
        assert_eq!(message_from_body(""), GENERIC_ERROR);
    }

    #[test]
    fn auth_errors_become_sign_in_prompts() {
        let err = ApiError::Http { status: 401, body: "{}".into() };
        assert_eq!(err.user_message(), "Please sign in to continue.");
    }

    #[test]
    fn problem_details_parses_the_validation_envelope() {
        let body = r#"{
            "type": "https://tools.ietf.org/html/rfc9110#section-15.5.1",
            "title": "One or more validation errors occurred.",
            "status": 400,
            "traceId": "00-abc-00",
            "errors": {"email": ["required"]}
        }"#;
        let details: ProblemDetails = serde_json::from_str(body).unwrap();
        assert_eq!(details.status, Some(400));
        assert_eq!(details.errors["email"], vec!["required".to_string()]);
        // The typed envelope and the untyped extraction agree.
        assert_eq!(message_from_body(body), "required");
    }
}
