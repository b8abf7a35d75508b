//! Credential handling and token refresh coordination

pub mod coordinator;
pub mod ports;

pub use coordinator::RefreshCoordinator;
