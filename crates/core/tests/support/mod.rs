//! Shared test helpers for `relay-core` integration tests.
//!
//! In-memory fakes for every port so pipeline behaviour can be exercised
//! without a network or a token store on disk.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{
    CredentialStore, RefreshCoordinator, RequestPipeline, RetryController, SessionEvent,
    SessionListener, TokenRefresher, Transport, TransportError, TransportResponse,
};
use relay_domain::{AuthConfig, RelayError, RequestContext, StructuredError, TokenPair};
use tokio::time::Instant;

type Handler =
    Box<dyn Fn(&RequestContext) -> Result<TransportResponse, TransportError> + Send + Sync>;

/// One dispatched attempt as the transport saw it
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub at: Instant,
    pub url: String,
    pub bearer: Option<String>,
    pub request: RequestContext,
}

/// Transport answering through a closure, or a queue of canned outcomes
pub struct ScriptedTransport {
    handler: Handler,
    log: Mutex<Vec<Dispatched>>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&RequestContext) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self { handler: Box::new(handler), log: Mutex::new(Vec::new()) }
    }

    /// Answer with `outcomes` in order, then `200` with an empty body
    pub fn sequence(outcomes: Vec<Result<TransportResponse, TransportError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(outcomes));
        Self::new(move |_| queue.lock().pop_front().unwrap_or_else(|| Ok(TransportResponse::new(200, ""))))
    }

    pub fn dispatched(&self) -> Vec<Dispatched> {
        self.log.lock().clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.log.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn dispatch(&self, request: &RequestContext) -> Result<TransportResponse, TransportError> {
        self.log.lock().push(Dispatched {
            at: Instant::now(),
            url: request.url.clone(),
            bearer: request.bearer_token().map(str::to_string),
            request: request.clone(),
        });
        (self.handler)(request)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tokens: Mutex<Option<TokenPair>>,
    csrf: Mutex<Option<String>>,
    pub clears: AtomicUsize,
}

impl MemoryStore {
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::default();
        *store.tokens.lock() = Some(TokenPair::new(access, refresh, 300));
        store
    }
}

impl CredentialStore for MemoryStore {
    fn get_access_token(&self) -> Option<String> {
        self.tokens.lock().as_ref().map(|pair| pair.access_token.clone())
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.tokens.lock().as_ref().map(|pair| pair.refresh_token.clone())
    }

    fn get_csrf_token(&self) -> Option<String> {
        self.csrf.lock().clone()
    }

    fn store_tokens(&self, pair: &TokenPair) -> Result<(), RelayError> {
        *self.tokens.lock() = Some(pair.clone());
        Ok(())
    }

    fn store_csrf_token(&self, token: &str) -> Result<(), RelayError> {
        *self.csrf.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear_tokens(&self) -> Result<(), RelayError> {
        *self.tokens.lock() = None;
        *self.csrf.lock() = None;
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Refresher returning a fixed outcome after yielding once
pub struct CountingRefresher {
    outcome: Result<TokenPair, StructuredError>,
    calls: AtomicUsize,
}

impl CountingRefresher {
    pub fn succeeding(access: &str, refresh: &str) -> Self {
        Self { outcome: Ok(TokenPair::new(access, refresh, 300)), calls: AtomicUsize::new(0) }
    }

    pub fn failing(error: StructuredError) -> Self {
        Self { outcome: Err(error), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(&self, _refresh_token: &str) -> Result<TokenPair, StructuredError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Leave room for concurrent callers to park behind this refresh
        tokio::task::yield_now().await;
        self.outcome.clone()
    }
}

#[derive(Default)]
pub struct RecordingSession {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSession {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }
}

impl SessionListener for RecordingSession {
    fn on_session_event(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}

/// A pipeline wired to fakes, with handles on every fake
pub struct Harness {
    pub pipeline: RequestPipeline,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryStore>,
    pub refresher: Arc<CountingRefresher>,
    pub session: Arc<RecordingSession>,
}

impl Harness {
    pub fn new(transport: ScriptedTransport, store: MemoryStore, refresher: CountingRefresher) -> Self {
        let transport = Arc::new(transport);
        let store = Arc::new(store);
        let refresher = Arc::new(refresher);
        let session = Arc::new(RecordingSession::default());
        let coordinator = Arc::new(RefreshCoordinator::new(
            refresher.clone(),
            store.clone(),
            session.clone(),
            AuthConfig::default(),
        ));
        let pipeline = RequestPipeline::new(
            transport.clone(),
            store.clone(),
            coordinator,
            RetryController::default(),
        );
        Self { pipeline, transport, store, refresher, session }
    }
}
