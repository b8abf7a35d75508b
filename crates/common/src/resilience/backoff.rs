//! Backoff strategies and retry decisions
//!
//! Delays are computed from a 0-indexed retry number, so the first retry of
//! an operation asks for `calculate_delay(0)`.

use std::time::Duration;

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after the given delay
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

impl RetryDecision {
    /// Whether this decision asks for another attempt
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::RetryAfter(_))
    }
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Exponential backoff: `initial_delay * base^attempt`, capped at
    /// `max_delay`
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Doubling backoff starting at `initial_delay` and capped at `max_delay`.
    pub fn doubling(initial_delay: Duration, max_delay: Duration) -> Self {
        Self::Exponential { initial_delay, base: 2.0, max_delay }
    }

    /// Calculate the delay before retry number `attempt` (0-indexed)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                // powi saturates to +inf for huge exponents, min() then caps it
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
        }
    }

    /// Upper bound of any delay this strategy can produce
    pub fn max_delay(&self) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { max_delay, .. } => *max_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_strategy_fixed() {
        let strategy = BackoffStrategy::Fixed(Duration::from_millis(250));

        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(250));
        assert_eq!(strategy.calculate_delay(7), Duration::from_millis(250));
        assert_eq!(strategy.max_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_backoff_strategy_exponential() {
        let strategy = BackoffStrategy::Exponential {
            initial_delay: Duration::from_millis(100),
            base: 3.0,
            max_delay: Duration::from_secs(10),
        };

        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(strategy.calculate_delay(1), Duration::from_millis(300));
        assert_eq!(strategy.calculate_delay(2), Duration::from_millis(900));
    }

    #[test]
    fn test_doubling_backoff_caps_at_max() {
        let strategy = BackoffStrategy::doubling(Duration::from_secs(1), Duration::from_secs(8));

        let delays: Vec<u128> = (0..6).map(|n| strategy.calculate_delay(n).as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 8000, 8000]);
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let strategy = BackoffStrategy::doubling(Duration::from_secs(1), Duration::from_secs(8));
        assert_eq!(strategy.calculate_delay(u32::MAX), Duration::from_secs(8));
    }

    #[test]
    fn test_retry_decision() {
        assert!(RetryDecision::RetryAfter(Duration::ZERO).is_retry());
        assert!(!RetryDecision::Stop.is_retry());
    }
}
