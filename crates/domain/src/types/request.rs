//! Request context for one logical API call
//!
//! A context is created once per logical call and replaced by a new value
//! on every replay (transient retry or post-refresh replay). Contexts are
//! never shared between concurrent calls.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::AUTHORIZATION_HEADER;
use crate::errors::RelayError;

/// HTTP methods understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// State-changing methods: exactly these receive a CSRF header.
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RelayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(RelayError::Config(format!("Unsupported HTTP method: {other}"))),
        }
    }
}

/// One logical API call
///
/// Header names are stored lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Correlates every attempt of this logical call
    pub request_id: Uuid,
    pub method: HttpMethod,
    /// Path relative to the configured base URL, or an absolute URL
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    /// Transient-network retries already spent
    pub retry_count: u32,
    /// Set on the replay that follows a successful token refresh
    pub is_retry_of_auth_failure: bool,
}

impl RequestContext {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            retry_count: 0,
            is_retry_of_auth_failure: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, url).with_body(body)
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, url).with_body(body)
    }

    pub fn patch(url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Patch, url).with_body(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Token carried in the `Authorization` header, if it is a bearer token
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION_HEADER).and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Context for the next transient-network retry. Everything but the
    /// retry counter is preserved.
    #[must_use]
    pub fn next_retry(mut self) -> Self {
        self.retry_count += 1;
        self
    }

    /// Context replayed after a successful refresh: new bearer token, marked
    /// as an auth retry, and a fresh transient-retry budget.
    #[must_use]
    pub fn into_auth_replay(mut self, access_token: &str) -> Self {
        self.set_header(AUTHORIZATION_HEADER, format!("Bearer {access_token}"));
        self.is_retry_of_auth_failure = true;
        self.retry_count = 0;
        self
    }
}
