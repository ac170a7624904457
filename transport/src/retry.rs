// transport/src/retry.rs

//! Exponential backoff with jitter for retryable transport failures.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff_ms: u64,
    pub jitter: f64,
}

impl RetryPolicy {
    pub fn new(retries: u32, backoff_ms: u64, jitter: f64) -> Self {
        Self {
            retries,
            backoff_ms,
            jitter,
        }
    }

    /// Delay before attempt `attempt` (0-indexed, so `attempt == 0` is the
    /// first retry after the initial failed call): `backoff_ms * 2^attempt`,
    /// jittered by `+/- jitter` fraction.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.backoff_ms as f64 * 2f64.powi(attempt as i32);
        let jitter_span = base * self.jitter;
        let offset = rand::thread_rng().gen_range(-jitter_span..=jitter_span);
        Duration::from_millis((base + offset).max(0.0) as u64)
    }
}

/// Whether an HTTP status code warrants a retry (server errors and rate
/// limiting), as opposed to a client error that will never succeed by
/// retrying alone.
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_on_average() {
        let policy = RetryPolicy::new(3, 250, 0.0);
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy::new(3, 1000, 0.3);
        for _ in 0..100 {
            let d = policy.delay_for(1).as_millis() as f64;
            assert!((1400.0..=2600.0).contains(&d), "delay {d} out of range");
        }
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(reqwest::StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(reqwest::StatusCode::OK));
    }
}
