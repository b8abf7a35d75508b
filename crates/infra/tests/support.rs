//! Shared helpers for `relay-infra` integration tests.

use std::sync::{Arc, Once};

use relay_core::SessionEvent;
use relay_domain::{ClientConfig, TokenPair};
use relay_infra::{ApiClient, ChannelSessionListener, InMemoryCredentialStore, LogFormat};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::MockServer;

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary (`RUST_LOG` controls it).
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        relay_infra::init_tracing(LogFormat::Pretty);
    });
}

/// Client pointed at `server`, with its session events routed to a channel.
pub fn client_for(
    server: &MockServer,
    session: Option<TokenPair>,
) -> (ApiClient, UnboundedReceiver<SessionEvent>) {
    init_test_tracing();

    let store = match session {
        Some(pair) => InMemoryCredentialStore::with_tokens(pair),
        None => InMemoryCredentialStore::new(),
    };
    let (listener, events) = ChannelSessionListener::new();

    let client = ApiClient::builder()
        .config(ClientConfig { base_url: server.uri(), log_requests: true, ..Default::default() })
        .credentials(Arc::new(store))
        .session_listener(Arc::new(listener))
        .build()
        .expect("client should build");

    (client, events)
}

/// Drain every event already sent on `events`.
pub fn drain(events: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
