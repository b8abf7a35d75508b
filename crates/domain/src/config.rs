//! Client configuration structures
//!
//! Every field has a default so partial TOML/JSON files are accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CSRF_HEADER;
use crate::errors::{RelayError, Result};

/// Top-level configuration for an API client instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL relative request paths are resolved against
    pub base_url: String,
    /// Per-attempt transport timeout
    pub timeout_ms: u64,
    /// Emit one `info` event per successful call (development builds)
    pub log_requests: bool,
    /// Header carrying the CSRF token on mutating requests
    pub csrf_header: String,
    pub user_agent: Option<String>,
    pub auth: AuthConfig,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_ms: 30_000,
            log_requests: false,
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            user_agent: None,
            auth: AuthConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check invariants serde cannot express
    ///
    /// # Errors
    /// Returns `RelayError::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(RelayError::Config("base_url must not be empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(RelayError::Config("timeout_ms must be greater than 0".to_string()));
        }
        if self.csrf_header.trim().is_empty() {
            return Err(RelayError::Config("csrf_header must not be empty".to_string()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(RelayError::Config(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }
}

/// Authentication endpoints and session teardown behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub refresh_path: String,
    pub login_path: String,
    pub logout_path: String,
    pub csrf_path: String,
    /// Where the UI should navigate after an unrecoverable auth failure
    pub login_redirect: String,
    /// A URL containing any of these is an authentication endpoint
    pub auth_path_markers: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            refresh_path: "/auth/refresh/".to_string(),
            login_path: "/auth/login/".to_string(),
            logout_path: "/auth/logout/".to_string(),
            csrf_path: "/auth/csrf/".to_string(),
            login_redirect: "/login".to_string(),
            auth_path_markers: vec!["/auth/".to_string()],
        }
    }
}

impl AuthConfig {
    /// Whether `url` targets an authentication endpoint
    pub fn is_auth_endpoint(&self, url: &str) -> bool {
        self.auth_path_markers.iter().any(|marker| !marker.is_empty() && url.contains(marker))
    }
}

/// Transient-network retry budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, base_delay_ms: 1_000, max_delay_ms: 8_000 }
    }
}
