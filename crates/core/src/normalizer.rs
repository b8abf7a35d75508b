//! Error normalizer
//!
//! Backends report failures in several shapes. Each known shape is tried in
//! priority order and the first match wins:
//!
//! 1. `{ "field_errors": { "<field>": ["msg", ...] } }`
//! 2. `{ "message": "..." }`
//! 3. `{ "detail": "..." }`
//! 4. anything else, including empty or unparseable bodies
//!
//! `code` comes from `message_code` or `code` regardless of the shape.

use indexmap::IndexMap;
use relay_domain::constants::GENERIC_ERROR_MESSAGE;
use relay_domain::{ErrorKind, FieldErrors, StructuredError};
use serde::Deserialize;
use serde_json::Value;

use crate::transport::ports::TransportResponse;

/// A single message or a list of messages for one field
#[derive(Deserialize)]
#[serde(untagged)]
enum FieldMessages {
    One(String),
    Many(Vec<String>),
}

impl FieldMessages {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(message) => vec![message],
            Self::Many(messages) => messages,
        }
    }
}

#[derive(Deserialize)]
struct FieldErrorsShape {
    field_errors: IndexMap<String, FieldMessages>,
}

#[derive(Deserialize)]
struct MessageShape {
    message: String,
}

#[derive(Deserialize)]
struct DetailShape {
    detail: String,
}

/// Recognised failure payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    /// Per-field validation messages; `first` is the primary message
    FieldErrors { first: String, fields: FieldErrors },
    Message(String),
    Detail(String),
    Unrecognized,
}

impl ErrorPayload {
    /// Classify `body` by trying each known shape in priority order
    pub fn parse(body: Option<&Value>) -> Self {
        let Some(body) = body else {
            return Self::Unrecognized;
        };

        if let Ok(shape) = FieldErrorsShape::deserialize(body) {
            let fields: FieldErrors = shape
                .field_errors
                .into_iter()
                .map(|(field, messages)| (field, messages.into_vec()))
                .collect();
            // An empty map carries no message; fall through to the next shape
            if let Some(first) = fields.values().flatten().next().cloned() {
                return Self::FieldErrors { first, fields };
            }
        }

        if let Ok(MessageShape { message }) = MessageShape::deserialize(body) {
            return Self::Message(message);
        }

        if let Ok(DetailShape { detail }) = DetailShape::deserialize(body) {
            return Self::Detail(detail);
        }

        Self::Unrecognized
    }

    /// Primary message for this payload
    pub fn message(&self) -> &str {
        match self {
            Self::FieldErrors { first, .. } => first,
            Self::Message(message) | Self::Detail(message) => message,
            Self::Unrecognized => GENERIC_ERROR_MESSAGE,
        }
    }
}

/// Read `message_code`, then `code`. Numeric codes are stringified.
fn extract_code(body: Option<&Value>) -> Option<String> {
    let body = body?;
    ["message_code", "code"].iter().find_map(|key| match body.get(key)? {
        Value::String(code) => Some(code.clone()),
        Value::Number(code) => Some(code.to_string()),
        _ => None,
    })
}

fn extract_detail(body: Option<&Value>) -> Option<String> {
    body?.get("detail")?.as_str().map(str::to_string)
}

/// Build a `StructuredError` of `kind` for a response with `status`.
///
/// Pure: the same inputs always produce an equal error.
pub fn normalize(kind: ErrorKind, status: u16, body: Option<&Value>) -> StructuredError {
    let payload = ErrorPayload::parse(body);

    let mut builder = StructuredError::response(kind, status, payload.message())
        .maybe_code(extract_code(body))
        .maybe_detail(extract_detail(body));

    if let ErrorPayload::FieldErrors { fields, .. } = payload {
        builder = builder.field_errors(fields);
    }
    if let Some(raw) = body {
        builder = builder.cause(raw.clone());
    }

    builder.build()
}

/// Parse a response body into JSON.
///
/// - body download failed → error
/// - empty body → `null`
/// - valid JSON → the value
/// - declared JSON that does not parse → error
/// - other UTF-8 text → a JSON string
/// - non-UTF-8 bytes → error
///
/// # Errors
/// Returns a description of why the body could not be read.
pub fn parse_body(response: &TransportResponse) -> Result<Value, String> {
    if let Some(reason) = &response.body_error {
        return Err(format!("failed to read response body: {reason}"));
    }
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    match serde_json::from_slice::<Value>(&response.body) {
        Ok(value) => Ok(value),
        Err(err) if response.declares_json() => Err(format!("invalid JSON body: {err}")),
        Err(_) => std::str::from_utf8(&response.body)
            .map(|text| Value::String(text.to_string()))
            .map_err(|err| format!("body is neither JSON nor UTF-8 text: {err}")),
    }
}

/// Normalize a non-2xx response as `ServerRejected`.
///
/// An unreadable body does not hide the server's verdict: the status is kept
/// and the generic message is used.
pub fn normalize_response(response: &TransportResponse) -> StructuredError {
    let body = parse_body(response).ok().filter(|value| !value.is_null());
    normalize(ErrorKind::ServerRejected, response.status, body.as_ref())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_field_errors_take_priority() {
        let body = json!({
            "field_errors": { "email": ["required"], "password": ["too short"] },
            "message": "Validation failed",
        });

        let err = normalize(ErrorKind::ServerRejected, 400, Some(&body));

        assert_eq!(err.message(), "required");
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["password"], vec!["too short".to_string()]);
        assert_eq!(err.cause(), Some(&body));
    }

    #[test]
    fn test_first_message_follows_payload_order() {
        let body: Value = serde_json::from_str(
            r#"{"field_errors":{"password":["too short"],"email":["required"]}}"#,
        )
        .unwrap();

        let err = normalize(ErrorKind::ServerRejected, 400, Some(&body));

        assert_eq!(err.message(), "too short");
        let names: Vec<&str> = err.field_errors().unwrap().keys().map(String::as_str).collect();
        assert_eq!(names, ["password", "email"]);
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let body = json!({ "field_errors": { "email": ["required"], "password": ["too short"] } });

        let first = normalize(ErrorKind::ServerRejected, 400, Some(&body));
        for _ in 0..10 {
            assert_eq!(normalize(ErrorKind::ServerRejected, 400, Some(&body)), first);
        }
        assert_eq!(first.message(), "required");
    }

    #[test]
    fn test_single_string_field_messages_are_accepted() {
        let body = json!({ "field_errors": { "name": "must be unique" } });
        let err = normalize(ErrorKind::ServerRejected, 409, Some(&body));

        assert_eq!(err.message(), "must be unique");
        assert_eq!(err.field_error("name"), Some(&["must be unique".to_string()][..]));
    }

    #[test]
    fn test_empty_field_errors_fall_through() {
        let body = json!({ "field_errors": { "email": [] }, "detail": "Bad request" });
        let err = normalize(ErrorKind::ServerRejected, 400, Some(&body));

        assert_eq!(err.message(), "Bad request");
        assert!(err.field_errors().is_none());
    }

    #[test]
    fn test_message_then_detail() {
        let both = json!({ "message": "Quota exceeded", "detail": "Upgrade your plan" });
        let err = normalize(ErrorKind::ServerRejected, 403, Some(&both));
        assert_eq!(err.message(), "Quota exceeded");
        assert_eq!(err.detail(), Some("Upgrade your plan"));

        let detail = json!({ "detail": "Not found." });
        assert_eq!(normalize(ErrorKind::ServerRejected, 404, Some(&detail)).message(), "Not found.");
    }

    #[test]
    fn test_generic_fallback() {
        let err = normalize(ErrorKind::ServerRejected, 500, None);
        assert_eq!(err.message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(err.status(), 500);
        assert!(err.cause().is_none());

        let odd = json!({ "message": 42 });
        assert_eq!(normalize(ErrorKind::ServerRejected, 500, Some(&odd)).message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_code_extraction() {
        let with_message_code = json!({ "message": "x", "message_code": "quota", "code": "other" });
        assert_eq!(extract_code(Some(&with_message_code)), Some("quota".to_string()));

        let with_code = json!({ "detail": "x", "code": "token_not_valid" });
        assert_eq!(extract_code(Some(&with_code)), Some("token_not_valid".to_string()));

        let numeric = json!({ "code": 1042 });
        assert_eq!(extract_code(Some(&numeric)), Some("1042".to_string()));

        assert_eq!(extract_code(Some(&json!({ "message": "x" }))), None);
    }

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(parse_body(&TransportResponse::new(204, "")).unwrap(), Value::Null);
        assert_eq!(parse_body(&TransportResponse::new(200, " \n")).unwrap(), Value::Null);
        assert_eq!(
            parse_body(&TransportResponse::new(200, r#"{"id": 1}"#)).unwrap(),
            json!({ "id": 1 })
        );
        assert_eq!(
            parse_body(&TransportResponse::new(200, "plain text")).unwrap(),
            Value::String("plain text".to_string())
        );
        assert!(parse_body(&TransportResponse::new(200, vec![0xff, 0xfe, 0x00])).is_err());

        let mut broken_json = TransportResponse::new(200, "{not json");
        broken_json.headers.insert("content-type".into(), "application/json".into());
        assert!(parse_body(&broken_json).is_err());
    }

    #[test]
    fn test_normalize_response_keeps_status_for_unreadable_body() {
        let mut response = TransportResponse::new(502, "{truncated");
        response.headers.insert("content-type".into(), "application/json".into());

        let err = normalize_response(&response);
        assert_eq!(err.status(), 502);
        assert_eq!(err.kind(), ErrorKind::ServerRejected);
        assert_eq!(err.message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_interrupted_body_is_unreadable() {
        let ok = TransportResponse::unreadable(200, "connection reset");
        assert!(parse_body(&ok).unwrap_err().contains("connection reset"));

        let err = normalize_response(&TransportResponse::unreadable(503, "connection reset"));
        assert_eq!(err.status(), 503);
        assert_eq!(err.kind(), ErrorKind::ServerRejected);
        assert_eq!(err.message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_text_body_is_kept_as_cause() {
        let err = normalize_response(&TransportResponse::new(503, "Service Unavailable"));
        assert_eq!(err.message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(err.cause(), Some(&Value::String("Service Unavailable".to_string())));
    }
}
