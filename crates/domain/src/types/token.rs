//! Access/refresh token pair
//!
//! Backends disagree on field names (`access` vs `access_token`), so the
//! serde aliases accept both. A refresh response that omits the refresh
//! token deserializes with an empty one; callers keep the previous value in
//! that case.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Access and refresh tokens with expiry metadata
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Token sent as `Authorization: Bearer <token>`
    #[serde(alias = "access")]
    pub access_token: String,

    /// Token exchanged for a new pair when the access token expires
    #[serde(alias = "refresh", default)]
    pub refresh_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Access token lifetime, `0` when the backend does not say
    #[serde(alias = "expires_in", default)]
    pub expires_in_seconds: i64,

    /// When this pair was issued (local clock)
    #[serde(default = "Utc::now")]
    pub issued_at: DateTime<Utc>,
}

impl TokenPair {
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in_seconds: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
            expires_in_seconds,
            issued_at: Utc::now(),
        }
    }

    /// Absolute expiry, `None` when no lifetime was reported
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        (self.expires_in_seconds > 0)
            .then(|| self.issued_at + Duration::seconds(self.expires_in_seconds))
    }

    /// `true` if the access token is expired or expires within
    /// `threshold_seconds`. Pairs without a lifetime never expire.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at() {
            Some(expires_at) => Utc::now() + Duration::seconds(threshold_seconds) >= expires_at,
            None => false,
        }
    }

    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Keep `previous` refresh token when this pair did not carry one.
    #[must_use]
    pub fn or_refresh_token(mut self, previous: Option<String>) -> Self {
        if self.refresh_token.is_empty() {
            if let Some(previous) = previous {
                self.refresh_token = previous;
            }
        }
        self
    }
}

// Tokens are secrets: never let them reach a log line through `{:?}`.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in_seconds", &self.expires_in_seconds)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}
