//! Session flows: login, logout and CSRF bootstrap

use std::fmt;

use relay_core::CredentialStore;
use relay_domain::{RelayError, StructuredError, TokenPair};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::client::ApiClient;

/// Failure of a session flow
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server call failed
    #[error(transparent)]
    Request(#[from] StructuredError),

    /// The call succeeded but its result could not be stored
    #[error(transparent)]
    Storage(#[from] RelayError),
}

/// Username/password pair posted to the login endpoint
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct CsrfResponse {
    #[serde(alias = "csrfToken", alias = "csrf")]
    csrf_token: String,
}

/// Login/logout against the configured auth endpoints
///
/// Shares the credential store of the [`ApiClient`] it was created from, so
/// a login is immediately visible to every request on that client.
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.credentials().get_access_token().is_some()
    }

    /// Exchange credentials for a token pair and store it.
    ///
    /// Any previous token pair is discarded first so that a stale access
    /// token cannot trigger a refresh of the old session. A stored CSRF token
    /// survives and is sent with the login request.
    ///
    /// # Errors
    /// `AuthError::Request` carries the server's rejection (for example an
    /// `AuthUnrecoverable` 401 with the "invalid credentials" message).
    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        let store = self.client.credentials();
        if let Err(err) = store.clear_session() {
            warn!(error = %err, "failed to discard previous session");
        }

        let path = &self.client.config().auth.login_path;
        let pair: TokenPair = self.client.post(path, credentials).await?;
        store.store_tokens(&pair)?;

        info!("login succeeded");
        Ok(pair)
    }

    /// Revoke the refresh token server-side, then forget every token.
    ///
    /// The server call is best-effort: local tokens are cleared even when it
    /// fails.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` only if clearing the store failed.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let store = self.client.credentials();

        if let Some(refresh_token) = store.get_refresh_token() {
            let path = &self.client.config().auth.logout_path;
            let body = json!({ "refresh": refresh_token });
            if let Err(err) = self.client.post::<_, serde_json::Value>(path, &body).await {
                debug!(status = err.status(), error = %err, "logout call failed, clearing locally");
            }
        }

        store.clear_tokens()?;
        info!("logged out");
        Ok(())
    }

    /// Fetch a CSRF token and store it for subsequent mutating requests.
    ///
    /// # Errors
    /// `AuthError::Request` if the call fails or the body has no token.
    #[instrument(skip_all)]
    pub async fn fetch_csrf_token(&self) -> Result<String, AuthError> {
        let path = &self.client.config().auth.csrf_path;
        let response: CsrfResponse = self.client.get(path).await?;

        self.client.credentials().store_csrf_token(&response.csrf_token)?;
        debug!("csrf token stored");
        Ok(response.csrf_token)
    }
}
