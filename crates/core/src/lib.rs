//! # Relay Core
//!
//! Request pipeline logic - no HTTP library, no storage medium.
//!
//! This crate contains:
//! - Port interfaces (traits) for the transport, credential store, token
//!   refresher and session listener
//! - The error normalizer and the transient-retry controller
//! - The refresh coordinator (single-flight token refresh with FIFO replay)
//! - The request pipeline that ties them together
//!
//! ## Architecture Principles
//! - Only depends on `relay-common` and `relay-domain`
//! - All I/O through traits implemented in `relay-infra`
//! - Multiple independent pipelines can coexist in one process: nothing here
//!   is a global

pub mod auth;
pub mod normalizer;
pub mod pipeline;
pub mod retry;
pub mod transport;

// Re-export specific items to avoid ambiguity
pub use auth::ports::{CredentialStore, SessionEvent, SessionListener, TokenRefresher};
pub use auth::RefreshCoordinator;
pub use normalizer::{normalize_response, parse_body, ErrorPayload};
pub use pipeline::RequestPipeline;
pub use retry::RetryController;
pub use transport::ports::{Transport, TransportError, TransportResponse};
