//! Port interface for sending one HTTP attempt
//!
//! A transport performs exactly one network attempt per call. Retries,
//! refresh and error normalization all happen above it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use relay_domain::constants::CONTENT_TYPE_HEADER;
use relay_domain::{RequestContext, StructuredError};
use thiserror::Error;

/// A response that reached us, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    /// Set when the status line arrived but the body could not be read
    pub body_error: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: BTreeMap::new(), body: body.into(), body_error: None }
    }

    /// Response whose body download failed after `status` arrived
    pub fn unreadable(status: u16, reason: impl Into<String>) -> Self {
        Self { body_error: Some(reason.into()), ..Self::new(status, Vec::new()) }
    }

    /// JSON response with a matching content type
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        let mut response = Self::new(status, value.to_string());
        response.headers.insert(CONTENT_TYPE_HEADER.to_string(), "application/json".to_string());
        response
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE_HEADER).map(String::as_str)
    }

    /// Whether the server declared a JSON body
    pub fn declares_json(&self) -> bool {
        self.content_type().is_some_and(|value| value.contains("json"))
    }
}

/// No response was received
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection aborted: {0}")]
    Aborted(String),

    /// The request could not be built; nothing was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Local transport failures eligible for retry
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }

    /// Caller-facing form of this failure (always `status = 0`)
    pub fn to_structured(&self) -> StructuredError {
        match self {
            Self::Connect(reason) | Self::Aborted(reason) => StructuredError::network(reason.clone()),
            Self::Timeout(reason) => StructuredError::timeout(reason.clone()),
            Self::InvalidRequest(reason) => StructuredError::invalid_request(reason.clone()),
        }
    }
}

/// Sends one attempt of a request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatch `request` and return whatever response arrived.
    ///
    /// # Errors
    /// Returns `TransportError` only when no HTTP response was received.
    async fn dispatch(&self, request: &RequestContext) -> Result<TransportResponse, TransportError>;
}
