//! Error types used throughout the workspace
//!
//! Two error families exist:
//! - [`StructuredError`] is the only error a caller of the request pipeline
//!   ever receives. Backend payload shapes, transport failures and auth
//!   teardown all collapse into it.
//! - [`RelayError`] covers everything that is not a request: configuration
//!   loading, credential persistence, serialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::constants::{
    INVALID_REQUEST_CODE, MALFORMED_RESPONSE_CODE, MALFORMED_RESPONSE_MESSAGE, NETWORK_ERROR_CODE,
    NETWORK_ERROR_MESSAGE, TIMEOUT_ERROR_CODE,
};

/// Main error type for non-request operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Per-field validation messages, in the order the server reported them
pub type FieldErrors = IndexMap<String, Vec<String>>;

/// Failure taxonomy surfaced to callers
///
/// An expired access token that is recovered by a refresh never becomes a
/// `StructuredError`, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Refresh failed, or a request was rejected with 401 after a refresh
    AuthUnrecoverable,
    /// No response was received, even after retries
    TransientNetwork,
    /// The server answered with a non-2xx status
    ServerRejected,
    /// A response arrived but its body could not be read
    Malformed,
    /// The request could not be built locally
    InvalidRequest,
}

impl ErrorKind {
    /// Stable label suitable for logs and metrics
    pub fn label(self) -> &'static str {
        match self {
            Self::AuthUnrecoverable => "auth_unrecoverable",
            Self::TransientNetwork => "transient_network",
            Self::ServerRejected => "server_rejected",
            Self::Malformed => "malformed",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

/// Normalized, shape-stable request failure
///
/// Fields are private: a value is immutable once built. `status` is `0`
/// exactly when no HTTP response was received.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct StructuredError {
    kind: ErrorKind,
    message: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<FieldErrors>,
    /// Raw payload, kept for diagnostics only
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<Value>,
}

impl StructuredError {
    /// Start building an error for a response that arrived with `status`.
    pub fn response(kind: ErrorKind, status: u16, message: impl Into<String>) -> StructuredErrorBuilder {
        StructuredErrorBuilder {
            error: Self {
                kind,
                message: message.into(),
                status,
                code: None,
                detail: None,
                field_errors: None,
                cause: None,
            },
        }
    }

    /// No response received: connection refused, reset, unreachable.
    pub fn network(reason: impl Into<String>) -> Self {
        Self::local(ErrorKind::TransientNetwork, NETWORK_ERROR_MESSAGE, NETWORK_ERROR_CODE)
            .with_detail(reason)
    }

    /// No response received before the transport timeout elapsed.
    pub fn timeout(reason: impl Into<String>) -> Self {
        Self::local(ErrorKind::TransientNetwork, NETWORK_ERROR_MESSAGE, TIMEOUT_ERROR_CODE)
            .with_detail(reason)
    }

    /// The request never left the process.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::local(ErrorKind::InvalidRequest, reason.clone(), INVALID_REQUEST_CODE)
            .with_detail(reason)
    }

    /// A response arrived with `status` but its body could not be parsed.
    pub fn malformed(status: u16, reason: impl Into<String>) -> Self {
        Self::response(ErrorKind::Malformed, status, MALFORMED_RESPONSE_MESSAGE)
            .code(MALFORMED_RESPONSE_CODE)
            .detail(reason)
            .build()
    }

    fn local(kind: ErrorKind, message: impl Into<String>, code: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            status: 0,
            code: Some(code.to_string()),
            detail: None,
            field_errors: None,
            cause: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Copy of this error re-classified as `kind`; all other fields kept.
    #[must_use]
    pub fn reclassified(&self, kind: ErrorKind) -> Self {
        Self { kind, ..self.clone() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Primary human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, or `0` when no response was received
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.field_errors.as_ref()
    }

    /// Messages reported for a single form field
    pub fn field_error(&self, field: &str) -> Option<&[String]> {
        self.field_errors.as_ref().and_then(|map| map.get(field)).map(Vec::as_slice)
    }

    /// Raw backend payload. Not meant for end-user text.
    pub fn cause(&self) -> Option<&Value> {
        self.cause.as_ref()
    }

    /// `true` when no HTTP response was received
    pub fn is_network(&self) -> bool {
        self.status == 0
    }

    pub fn is_auth_failure(&self) -> bool {
        self.kind == ErrorKind::AuthUnrecoverable
    }
}

/// Builder for response-carrying [`StructuredError`] values
#[derive(Debug)]
#[must_use]
pub struct StructuredErrorBuilder {
    error: StructuredError,
}

impl StructuredErrorBuilder {
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.error.code = Some(code.into());
        self
    }

    pub fn maybe_code(mut self, code: Option<String>) -> Self {
        self.error.code = code;
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.error.detail = Some(detail.into());
        self
    }

    pub fn maybe_detail(mut self, detail: Option<String>) -> Self {
        self.error.detail = detail;
        self
    }

    pub fn field_errors(mut self, field_errors: FieldErrors) -> Self {
        self.error.field_errors = Some(field_errors);
        self
    }

    pub fn cause(mut self, cause: Value) -> Self {
        self.error.cause = Some(cause);
        self
    }

    pub fn build(self) -> StructuredError {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_have_status_zero() {
        let network = StructuredError::network("connection refused");
        assert_eq!(network.status(), 0);
        assert!(network.is_network());
        assert_eq!(network.kind(), ErrorKind::TransientNetwork);
        assert_eq!(network.code(), Some(NETWORK_ERROR_CODE));
        assert_eq!(network.detail(), Some("connection refused"));

        let timeout = StructuredError::timeout("deadline elapsed");
        assert_eq!(timeout.status(), 0);
        assert_eq!(timeout.code(), Some(TIMEOUT_ERROR_CODE));
    }

    #[test]
    fn test_response_errors_keep_status() {
        let err = StructuredError::response(ErrorKind::ServerRejected, 422, "bad input")
            .code("validation")
            .build();

        assert_eq!(err.status(), 422);
        assert!(!err.is_network());
        assert_eq!(err.to_string(), "bad input");
        assert_eq!(err.code(), Some("validation"));
    }

    #[test]
    fn test_malformed_keeps_status() {
        let err = StructuredError::malformed(200, "expected value at line 1");
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(err.status(), 200);
        assert_eq!(err.message(), MALFORMED_RESPONSE_MESSAGE);
    }

    #[test]
    fn test_reclassified_preserves_fields() {
        let mut fields = FieldErrors::new();
        fields.insert("email".to_string(), vec!["required".to_string()]);
        let original = StructuredError::response(ErrorKind::ServerRejected, 401, "nope")
            .field_errors(fields)
            .build();

        let auth = original.reclassified(ErrorKind::AuthUnrecoverable);
        assert!(auth.is_auth_failure());
        assert_eq!(auth.status(), 401);
        assert_eq!(auth.field_error("email"), Some(&["required".to_string()][..]));
        assert_eq!(original.kind(), ErrorKind::ServerRejected);
    }

    #[test]
    fn test_serializes_without_empty_fields() {
        let err = StructuredError::response(ErrorKind::ServerRejected, 404, "missing").build();
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["kind"], "server_rejected");
        assert_eq!(json["status"], 404);
        assert!(json.get("field_errors").is_none());
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::AuthUnrecoverable.label(), "auth_unrecoverable");
        assert_eq!(ErrorKind::TransientNetwork.label(), "transient_network");
        assert_eq!(ErrorKind::InvalidRequest.label(), "invalid_request");
    }
}
