//! Resilience patterns for transient failure handling
//!
//! This module provides **generic, reusable** pieces that domain-specific
//! retry controllers compose:
//! - **Backoff**: delay calculation for the n-th retry (fixed or capped
//!   exponential)
//! - **Decisions**: the retry/stop verdict returned by a policy
//!
//! Policies that decide *which* failures are retryable live with the code
//! that owns the failure type (see `relay-core`'s retry controller).

pub mod backoff;

pub use backoff::{BackoffStrategy, RetryDecision};
