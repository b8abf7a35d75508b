//! Typed API client
//!
//! Thin facade over the request pipeline: serializes request bodies,
//! deserializes response bodies into caller types, and wires the default
//! adapters when the caller does not supply their own.

use std::sync::Arc;

use relay_core::{
    CredentialStore, RefreshCoordinator, RequestPipeline, RetryController, SessionListener,
    TokenRefresher, Transport,
};
use relay_domain::{ClientConfig, RelayError, RequestContext, StructuredError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::auth::AuthService;
use super::refresh::HttpTokenRefresher;
use crate::credentials::InMemoryCredentialStore;
use crate::http::ReqwestTransport;
use crate::session::LoggingSessionListener;

/// API client with transparent token refresh and transient-failure retry
#[derive(Clone)]
pub struct ApiClient {
    pipeline: Arc<RequestPipeline>,
    credentials: Arc<dyn CredentialStore>,
    config: ClientConfig,
}

impl ApiClient {
    /// Client with default adapters for `config`
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self, RelayError> {
        Self::builder().config(config).build()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    /// Login, logout and CSRF flows sharing this client's session
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.clone())
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns the normalized failure, or `Malformed` if the body does not
    /// deserialize into `T`
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StructuredError> {
        self.send(RequestContext::get(path)).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get); an unserializable body is an
    /// `InvalidRequest` and is never sent
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, StructuredError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(RequestContext::post(path, encode_body(body)?)).await
    }

    /// # Errors
    ///
    /// Same as [`post`](Self::post)
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, StructuredError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(RequestContext::put(path, encode_body(body)?)).await
    }

    /// # Errors
    ///
    /// Same as [`post`](Self::post)
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, StructuredError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(RequestContext::patch(path, encode_body(body)?)).await
    }

    /// # Errors
    ///
    /// Same as [`get`](Self::get)
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, StructuredError> {
        self.send(RequestContext::delete(path)).await
    }

    /// Execute a prepared context and return the parsed JSON body untouched
    ///
    /// # Errors
    ///
    /// Returns the normalized failure
    pub async fn execute_raw(&self, context: RequestContext) -> Result<Value, StructuredError> {
        self.pipeline.execute(context).await
    }

    async fn send<T: DeserializeOwned>(&self, context: RequestContext) -> Result<T, StructuredError> {
        let (status, body) = self.pipeline.execute_with_status(context).await?;
        decode_body(status, body)
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, StructuredError> {
    serde_json::to_value(body)
        .map_err(|err| StructuredError::invalid_request(format!("failed to serialize body: {err}")))
}

/// 204/205 and empty bodies arrive as `null`, which `()` and `Option<T>`
/// accept.
pub(crate) fn decode_body<T: DeserializeOwned>(status: u16, body: Value) -> Result<T, StructuredError> {
    serde_json::from_value(body).map_err(|err| {
        StructuredError::malformed(status, format!("failed to parse response: {err}"))
    })
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    credentials: Option<Arc<dyn CredentialStore>>,
    session: Option<Arc<dyn SessionListener>>,
    transport: Option<Arc<dyn Transport>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl ApiClientBuilder {
    /// Set the client configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the credential store (default: in-memory)
    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the listener told about unrecoverable sessions (default: log only)
    pub fn session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.session = Some(listener);
        self
    }

    /// Replace the reqwest transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the refresh-endpoint client
    pub fn token_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if the configuration is invalid or the
    /// default transport cannot be created
    pub fn build(self) -> Result<ApiClient, RelayError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(&config)?),
        };
        let credentials =
            self.credentials.unwrap_or_else(|| Arc::new(InMemoryCredentialStore::new()));
        let session = self.session.unwrap_or_else(|| Arc::new(LoggingSessionListener));
        let refresher = self.refresher.unwrap_or_else(|| {
            Arc::new(HttpTokenRefresher::new(transport.clone(), config.auth.refresh_path.clone()))
        });

        let coordinator = Arc::new(RefreshCoordinator::new(
            refresher,
            credentials.clone(),
            session,
            config.auth.clone(),
        ));
        let pipeline = RequestPipeline::new(
            transport,
            credentials.clone(),
            coordinator,
            RetryController::from_config(&config.retry),
        )
        .with_csrf_header(config.csrf_header.clone())
        .with_request_logging(config.log_requests);

        Ok(ApiClient { pipeline: Arc::new(pipeline), credentials, config })
    }
}
