//! Port interfaces for credentials and session lifecycle
//!
//! These traits abstract the credential store, the refresh endpoint and the
//! UI's reaction to a dead session so the coordinator can be tested with
//! in-memory fakes.

use async_trait::async_trait;
use relay_domain::{Result, StructuredError, TokenPair};

/// Synchronous key-value store for the session's tokens
///
/// Reads never block. Writes persist through whatever medium the
/// implementation uses.
pub trait CredentialStore: Send + Sync {
    fn get_access_token(&self) -> Option<String>;

    fn get_refresh_token(&self) -> Option<String>;

    fn get_csrf_token(&self) -> Option<String>;

    /// Replace the stored token pair
    ///
    /// # Errors
    /// Returns `RelayError::Storage` if the pair could not be persisted.
    fn store_tokens(&self, pair: &TokenPair) -> Result<()>;

    /// # Errors
    /// Returns `RelayError::Storage` if the token could not be persisted.
    fn store_csrf_token(&self, token: &str) -> Result<()>;

    /// Forget access, refresh and CSRF tokens
    ///
    /// # Errors
    /// Returns `RelayError::Storage` if persisted tokens could not be removed.
    fn clear_tokens(&self) -> Result<()>;

    /// Forget the access/refresh pair but keep the CSRF token
    ///
    /// # Errors
    /// Returns `RelayError::Storage` if the change could not be persisted.
    fn clear_session(&self) -> Result<()> {
        let csrf = self.get_csrf_token();
        self.clear_tokens()?;
        match csrf {
            Some(token) => self.store_csrf_token(&token),
            None => Ok(()),
        }
    }
}

/// Exchanges a refresh token for a new token pair
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Perform exactly one refresh network call.
    ///
    /// # Errors
    /// Returns the normalized failure of the refresh call.
    async fn refresh(&self, refresh_token: &str) -> std::result::Result<TokenPair, StructuredError>;
}

/// Signal raised when the session cannot be recovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Tokens were cleared; the UI should navigate to `redirect_to`
    LoginRequired { redirect_to: String, failed_url: String },
}

/// Receives session lifecycle events
pub trait SessionListener: Send + Sync {
    fn on_session_event(&self, event: SessionEvent);
}
