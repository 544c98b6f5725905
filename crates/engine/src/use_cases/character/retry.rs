//! Caller-side retry for character generation.

use std::time::Duration;

use crate::infrastructure::generation_client::UpstreamError;
use crate::infrastructure::ports::RandomPort;

use super::GenerationError;

/// Upper bound on attempts a caller may ask for.
pub const MAX_ATTEMPTS: u32 = 5;

/// How many times to attempt a generation and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Clamped to `1..=MAX_ATTEMPTS`.
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay_ms: u64,
    /// Upper bound on any single delay
    pub max_delay_ms: u64,
    /// Fraction (0.0-1.0) of the delay randomized in either direction
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.min(MAX_ATTEMPTS);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS)
    }

    /// Delay after failed attempt number `attempt` (1-based): exponential, capped, jittered.
    pub fn delay_after(&self, attempt: u32, random: &dyn RandomPort) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.max_delay_ms);

        let jitter_range = (capped as f64 * self.jitter_factor.clamp(0.0, 1.0)) as i64;
        let jitter_range = jitter_range.min(i32::MAX as i64) as i32;
        let millis = if jitter_range > 0 {
            let jitter = random.gen_range(-jitter_range, jitter_range) as i64;
            (capped as i64 + jitter).max(0) as u64
        } else {
            capped
        };
        Duration::from_millis(millis)
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(error: &GenerationError) -> bool {
        match error {
            GenerationError::Validation(_) => true,
            GenerationError::Upstream(upstream) => match upstream {
                UpstreamError::Timeout
                | UpstreamError::MalformedPayload(_)
                | UpstreamError::Transport(_) => true,
                UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
                UpstreamError::Unavailable(_) | UpstreamError::InvalidRequest(_) => false,
            },
            GenerationError::InvalidRequest(_) | GenerationError::Task(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::use_cases::response_validator::ValidationError;

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 350,
            jitter_factor: 0.0,
        };
        let random = FixedRandom(0);
        assert_eq!(policy.delay_after(1, &random), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2, &random), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3, &random), Duration::from_millis(350));
    }

    #[test]
    fn jitter_stays_within_factor() {
        let policy = RetryPolicy {
            base_delay_ms: 1000,
            jitter_factor: 0.2,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_after(1, &FixedRandom(i32::MAX)), Duration::from_millis(1200));
        assert_eq!(policy.delay_after(1, &FixedRandom(i32::MIN)), Duration::from_millis(800));
    }

    #[test]
    fn default_is_a_single_attempt() {
        assert_eq!(RetryPolicy::default().attempts(), 1);
        assert_eq!(RetryPolicy::default().with_max_attempts(0).attempts(), 1);
    }

    #[test]
    fn requested_attempts_saturate_at_the_limit() {
        let policy = RetryPolicy::default().with_max_attempts(u32::MAX);
        assert_eq!(policy.max_attempts, MAX_ATTEMPTS);
        assert_eq!(policy.attempts(), MAX_ATTEMPTS);

        let literal = RetryPolicy {
            max_attempts: 1_000,
            ..RetryPolicy::default()
        };
        assert_eq!(literal.attempts(), MAX_ATTEMPTS);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let bad_request = GenerationError::Upstream(UpstreamError::Status {
            status: 400,
            body: "bad".to_string(),
        });
        let overloaded = GenerationError::Upstream(UpstreamError::Status {
            status: 503,
            body: "busy".to_string(),
        });
        let invalid = GenerationError::Validation(ValidationError::new("missing name", "{}"));
        assert!(!RetryPolicy::is_retryable(&bad_request));
        assert!(RetryPolicy::is_retryable(&overloaded));
        assert!(RetryPolicy::is_retryable(&invalid));
    }
}
