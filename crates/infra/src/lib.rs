//! # Relay Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-backed HTTP transport
//! - The refresh-endpoint client and the typed `ApiClient` facade
//! - In-memory and file-backed credential stores
//! - Session listeners
//! - Configuration loading (environment and JSON/TOML files)
//!
//! ## Architecture
//! - Implements traits defined in `relay-core`
//! - Depends on `relay-common`, `relay-domain` and `relay-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod credentials;
pub mod http;
pub mod session;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, AuthError, AuthService, Credentials, HttpTokenRefresher};
pub use credentials::{FileCredentialStore, InMemoryCredentialStore};
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use relay_common::{init_tracing, LogFormat};
pub use session::{ChannelSessionListener, LoggingSessionListener};
