//! Session listeners
//!
//! The refresh coordinator raises [`SessionEvent::LoginRequired`] when a
//! session cannot be recovered. These adapters forward it to whatever the
//! embedding application uses to navigate.

use relay_core::{SessionEvent, SessionListener};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Logs session events and does nothing else. Used when no listener is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSessionListener;

impl SessionListener for LoggingSessionListener {
    fn on_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::LoginRequired { redirect_to, failed_url } => {
                warn!(%redirect_to, %failed_url, "session expired, login required");
            }
        }
    }
}

/// Forwards session events over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSessionListener {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelSessionListener {
    /// Listener plus the receiving end for the UI layer
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl SessionListener for ChannelSessionListener {
    fn on_session_event(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            debug!("session event receiver dropped");
        }
    }
}
