//! Retry configuration for failed requests.

use std::time::Duration;

use crate::error::RequestError;

/// When [`HttpRequester`](super::HttpRequester) retries a failed request.
///
/// Only 5xx responses and network failures are retried; the delay doubles
/// after each attempt.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use filemaker_lib::transport::RetryConfig;
///
/// let patient = RetryConfig {
///     max_retries: 5,
///     max_delay: Duration::from_secs(60),
///     ..RetryConfig::default()
/// };
/// assert!(patient.retry_on_5xx);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt).
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Whether to retry on HTTP 5xx (server errors).
    pub retry_on_5xx: bool,
    /// Whether to retry on network errors and timeouts.
    pub retry_on_network: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            retry_on_5xx: true,
            retry_on_network: true,
        }
    }
}

impl RetryConfig {
    /// Creates a config with all retries disabled.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            retry_on_5xx: false,
            retry_on_network: false,
            ..Default::default()
        }
    }

    /// Whether `error` should be retried after `attempts` retries.
    pub fn should_retry(&self, error: &RequestError, attempts: u32) -> bool {
        if attempts >= self.max_retries || !error.is_retryable() {
            return false;
        }
        match error {
            RequestError::Http { .. } => self.retry_on_5xx,
            _ => self.retry_on_network,
        }
    }

    /// The delay following `delay`.
    pub fn next_delay(&self, delay: Duration) -> Duration {
        (delay * 2).min(self.max_delay)
    }
}
