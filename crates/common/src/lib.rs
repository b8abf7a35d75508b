//! Modular common utilities shared across Relay crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: side-effect free building blocks (backoff strategies)
//! - `observability`: tracing subscriber bootstrap (not included by default)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod resilience;

// Observability tier
// --------------------------------------------------------------
#[cfg(feature = "observability")]
pub mod observability;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "observability")]
pub use observability::{init_tracing, LogFormat};
#[cfg(feature = "foundation")]
pub use resilience::{BackoffStrategy, RetryDecision};
