//! # Relay Domain
//!
//! Data types shared by every Relay crate.
//!
//! This crate contains:
//! - Credential and request types (`TokenPair`, `RequestContext`)
//! - The caller-facing `StructuredError` and the crate-wide `RelayError`
//! - Configuration structures
//! - Domain constants (error codes, header names)
//!
//! ## Architecture
//! - No dependencies on other Relay crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
