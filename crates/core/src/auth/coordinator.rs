//! Single-flight token refresh with FIFO replay
//!
//! The first request that observes an expired token becomes the *leader*
//! and issues the one refresh call. Requests that hit a 401 while that call
//! is in flight are parked as waiters and settled, in arrival order, with
//! the leader's outcome.
//!
//! ```text
//!   Idle ──401──► Refreshing ──refresh returns──► Settling ──queue drained──► Idle
//!                    ▲  │
//!                    └──┘ 401 while refreshing: park waiter
//! ```
//!
//! The lock state is checked and flipped under one synchronous mutex
//! acquisition before the first await, so two callers can never both become
//! leader. If the leader's future is dropped mid-refresh, a drop guard still
//! settles every waiter and returns the state to idle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use relay_domain::constants::SESSION_EXPIRED_CODE;
use relay_domain::{AuthConfig, ErrorKind, RequestContext, StructuredError};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::ports::{CredentialStore, SessionEvent, SessionListener, TokenRefresher};

/// New access token, or the error every request of the batch fails with
type RefreshOutcome = Result<String, StructuredError>;

/// A request suspended until the in-flight refresh settles
struct Waiter {
    request_id: Uuid,
    resolve: oneshot::Sender<RefreshOutcome>,
}

/// Invariant: `queue` is non-empty only while `is_refreshing` is true
#[derive(Default)]
struct RefreshLockState {
    is_refreshing: bool,
    queue: VecDeque<Waiter>,
}

enum Role {
    /// Another call already rotated the token; replay with it
    Replay(String),
    Leader,
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

/// Coordinates token refresh for one client instance
pub struct RefreshCoordinator {
    state: Mutex<RefreshLockState>,
    refresher: Arc<dyn TokenRefresher>,
    store: Arc<dyn CredentialStore>,
    session: Arc<dyn SessionListener>,
    auth: AuthConfig,
    refresh_calls: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        refresher: Arc<dyn TokenRefresher>,
        store: Arc<dyn CredentialStore>,
        session: Arc<dyn SessionListener>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            state: Mutex::new(RefreshLockState::default()),
            refresher,
            store,
            session,
            auth,
            refresh_calls: AtomicU64::new(0),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().is_refreshing
    }

    /// Requests currently parked behind the in-flight refresh
    pub fn queued_waiters(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Refresh network calls issued since construction
    pub fn refresh_calls(&self) -> u64 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    /// Obtain a fresh access token for `request`, which was rejected with
    /// 401 (`rejection`).
    ///
    /// # Errors
    /// Returns an `AuthUnrecoverable` error when the refresh fails, when no
    /// refresh token is stored, or when the refresh was abandoned. The
    /// session has already been torn down in those cases.
    #[instrument(skip_all, fields(request_id = %request.request_id, url = %request.url))]
    pub async fn recover(
        &self,
        request: &RequestContext,
        rejection: &StructuredError,
    ) -> RefreshOutcome {
        match self.enter(request) {
            Role::Replay(token) => {
                debug!("access token already rotated, replaying without refresh");
                Ok(token)
            }
            Role::Waiter(settled) => {
                debug!("refresh in flight, parking request");
                settled.await.unwrap_or_else(|_| Err(abandoned_refresh_error()))
            }
            Role::Leader => self.lead(request, rejection).await,
        }
    }

    fn enter(&self, request: &RequestContext) -> Role {
        let mut state = self.state.lock();

        if state.is_refreshing {
            let (resolve, settled) = oneshot::channel();
            state.queue.push_back(Waiter { request_id: request.request_id, resolve });
            return Role::Waiter(settled);
        }

        if let Some(current) = self.store.get_access_token() {
            if request.bearer_token() != Some(current.as_str()) {
                return Role::Replay(current);
            }
        }

        state.is_refreshing = true;
        Role::Leader
    }

    async fn lead(&self, request: &RequestContext, rejection: &StructuredError) -> RefreshOutcome {
        let guard = SettleGuard { coordinator: self, settled: false };

        let outcome = match self.store.get_refresh_token().filter(|token| !token.is_empty()) {
            None => {
                warn!("no refresh token available");
                Err(rejection.reclassified(ErrorKind::AuthUnrecoverable))
            }
            Some(refresh_token) => {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                match self.refresher.refresh(&refresh_token).await {
                    Ok(pair) => {
                        let pair = pair.or_refresh_token(Some(refresh_token));
                        if let Err(err) = self.store.store_tokens(&pair) {
                            warn!(error = %err, "failed to persist refreshed tokens");
                        }
                        info!("access token refreshed");
                        Ok(pair.access_token)
                    }
                    Err(err) => {
                        warn!(status = err.status(), error = %err, "token refresh failed");
                        Err(err.reclassified(ErrorKind::AuthUnrecoverable))
                    }
                }
            }
        };

        guard.settle(&outcome);

        if outcome.is_err() {
            self.end_session(&request.url);
        }
        outcome
    }

    /// Clear every stored token and ask the UI to sign in again.
    ///
    /// The navigation signal is skipped when `failed_url` is itself an
    /// authentication endpoint, so a failing login page does not redirect
    /// to itself.
    pub fn end_session(&self, failed_url: &str) {
        if let Err(err) = self.store.clear_tokens() {
            warn!(error = %err, "failed to clear stored tokens");
        }

        if self.auth.is_auth_endpoint(failed_url) {
            debug!(url = failed_url, "auth endpoint failed, skipping login redirect");
            return;
        }

        info!(redirect_to = %self.auth.login_redirect, "session ended, login required");
        self.session.on_session_event(SessionEvent::LoginRequired {
            redirect_to: self.auth.login_redirect.clone(),
            failed_url: failed_url.to_string(),
        });
    }

    /// Settle every waiter in arrival order, then return to idle.
    fn drain(&self, outcome: &RefreshOutcome) {
        let mut state = self.state.lock();
        while let Some(waiter) = state.queue.pop_front() {
            if waiter.resolve.send(outcome.clone()).is_err() {
                debug!(request_id = %waiter.request_id, "waiter gone before refresh settled");
            }
        }
        state.is_refreshing = false;
    }
}

fn abandoned_refresh_error() -> StructuredError {
    StructuredError::response(
        ErrorKind::AuthUnrecoverable,
        401,
        "Your session has expired. Please sign in again.",
    )
    .code(SESSION_EXPIRED_CODE)
    .build()
}

/// Settles the batch even if the leader's future is dropped mid-refresh
struct SettleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl SettleGuard<'_> {
    fn settle(mut self, outcome: &RefreshOutcome) {
        self.coordinator.drain(outcome);
        self.settled = true;
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("refresh abandoned before completion, rejecting parked requests");
            self.coordinator.drain(&Err(abandoned_refresh_error()));
        }
    }
}
