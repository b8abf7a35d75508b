//! Retry/backoff controller for transient network failures
//!
//! Only failures where no HTTP response arrived are eligible. HTTP error
//! statuses are never retried here.

use std::time::Duration;

use relay_common::{BackoffStrategy, RetryDecision};
use relay_domain::RetryConfig;

use crate::transport::ports::TransportError;

/// Decides whether a failed attempt is retried and how long to wait
#[derive(Debug, Clone, PartialEq)]
pub struct RetryController {
    max_retries: u32,
    backoff: BackoffStrategy,
}

impl Default for RetryController {
    /// 3 retries at 1s, 2s, 4s (capped at 8s)
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryController {
    pub fn new(max_retries: u32, backoff: BackoffStrategy) -> Self {
        Self { max_retries, backoff }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            BackoffStrategy::doubling(
                Duration::from_millis(config.base_delay_ms),
                Duration::from_millis(config.max_delay_ms),
            ),
        )
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry_count` (0-indexed)
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.backoff.calculate_delay(retry_count)
    }

    /// Verdict for `error` on a call that already spent `retry_count` retries
    pub fn decide(&self, error: &TransportError, retry_count: u32) -> RetryDecision {
        if !error.is_transient() || retry_count >= self.max_retries {
            return RetryDecision::Stop;
        }
        RetryDecision::RetryAfter(self.delay_for(retry_count))
    }
}
