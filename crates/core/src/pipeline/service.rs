//! Request pipeline
//!
//! The single entry point for API calls. One logical call loops over
//! attempts until it resolves:
//!
//! - 2xx: parse the body and return it
//! - 401 on a first attempt: hand over to the refresh coordinator, then
//!   replay once with the new token
//! - 401 on a replay: the session is over
//! - any other status: normalize and fail
//! - no response at all: back off and retry while the budget allows

use std::sync::Arc;
use std::time::Instant;

use relay_common::RetryDecision;
use relay_domain::constants::{AUTHORIZATION_HEADER, DEFAULT_CSRF_HEADER, REQUEST_ID_HEADER};
use relay_domain::{ErrorKind, RequestContext, StructuredError};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::auth::ports::CredentialStore;
use crate::auth::RefreshCoordinator;
use crate::normalizer::{normalize_response, parse_body};
use crate::retry::RetryController;
use crate::transport::ports::{Transport, TransportResponse};

const UNAUTHORIZED: u16 = 401;

/// Executes requests with auth recovery, retry and error normalization
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    retry: RetryController,
    csrf_header: String,
    log_requests: bool,
}

impl RequestPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
        retry: RetryController,
    ) -> Self {
        Self {
            transport,
            store,
            coordinator,
            retry,
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            log_requests: false,
        }
    }

    #[must_use]
    pub fn with_csrf_header(mut self, header: impl Into<String>) -> Self {
        self.csrf_header = header.into();
        self
    }

    /// Emit `api_request_completed` for every successful call
    #[must_use]
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Execute one logical call.
    ///
    /// Returns the fully parsed body (`null` for an empty one).
    ///
    /// # Errors
    /// Every failure is a `StructuredError`; `status() == 0` means no
    /// response was received.
    pub async fn execute(&self, context: RequestContext) -> Result<Value, StructuredError> {
        self.execute_with_status(context).await.map(|(_, body)| body)
    }

    /// [`execute`](Self::execute), also returning the final 2xx status.
    ///
    /// # Errors
    /// Same as [`execute`](Self::execute).
    #[instrument(
        skip_all,
        fields(request_id = %context.request_id, method = %context.method, url = %context.url)
    )]
    pub async fn execute_with_status(
        &self,
        mut context: RequestContext,
    ) -> Result<(u16, Value), StructuredError> {
        let started = Instant::now();

        loop {
            let attempt = self.prepare(context);

            let response = match self.transport.dispatch(&attempt).await {
                Ok(response) => response,
                Err(err) => match self.retry.decide(&err, attempt.retry_count) {
                    RetryDecision::RetryAfter(delay) => {
                        debug!(
                            attempt = attempt.retry_count + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "transient network failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        context = attempt.next_retry();
                        continue;
                    }
                    RetryDecision::Stop => {
                        warn!(retries = attempt.retry_count, error = %err, "request failed without response");
                        return Err(err.to_structured());
                    }
                },
            };

            if response.is_success() {
                return self.complete(&attempt, &response, started).map(|body| (response.status, body));
            }

            if response.status != UNAUTHORIZED {
                let err = normalize_response(&response);
                warn!(status = response.status, kind = err.kind().label(), "request rejected");
                return Err(err);
            }

            let rejection = normalize_response(&response);
            if attempt.is_retry_of_auth_failure {
                warn!("401 after token refresh, session is unrecoverable");
                self.coordinator.end_session(&attempt.url);
                return Err(rejection.reclassified(ErrorKind::AuthUnrecoverable));
            }

            let token = self.coordinator.recover(&attempt, &rejection).await?;
            debug!("replaying request with refreshed token");
            context = attempt.into_auth_replay(&token);
        }
    }

    /// Attach per-attempt headers. Credentials are read fresh on every
    /// attempt; an auth replay keeps the token it was handed.
    fn prepare(&self, mut context: RequestContext) -> RequestContext {
        if !context.is_retry_of_auth_failure {
            match self.store.get_access_token() {
                Some(token) => context.set_header(AUTHORIZATION_HEADER, format!("Bearer {token}")),
                None => {
                    context.headers.remove(AUTHORIZATION_HEADER);
                }
            }
        }

        context.set_header(REQUEST_ID_HEADER, context.request_id.to_string());

        if context.method.is_mutating() {
            if let Some(csrf) = self.store.get_csrf_token() {
                context.set_header(&self.csrf_header, csrf);
            }
        }

        context
    }

    fn complete(
        &self,
        attempt: &RequestContext,
        response: &TransportResponse,
        started: Instant,
    ) -> Result<Value, StructuredError> {
        let body = parse_body(response).map_err(|reason| {
            warn!(status = response.status, reason = %reason, "unreadable response body");
            StructuredError::malformed(response.status, reason)
        })?;

        if self.log_requests {
            info!(
                method = %attempt.method,
                url = %attempt.url,
                status = response.status,
                duration_ms = started.elapsed().as_millis() as u64,
                "api_request_completed"
            );
        }

        Ok(body)
    }
}
