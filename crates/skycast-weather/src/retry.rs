//! Bounded retry for weather requests.
//!
//! Only transient failures are retried: timeouts, refused or dropped
//! connections, 5xx, 408 and 429. Anything else in the 4xx range (unknown
//! location, rejected or exhausted key) is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use skycast_core::WeatherConfig;

/// Backoff never grows past this multiple of the initial delay.
const MAX_BACKOFF_FACTOR: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from_config(&WeatherConfig::default())
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn from_config(config: &WeatherConfig) -> Self {
        Self {
            max_retries: config.retry_attempts,
            initial_delay: Duration::from_millis(config.retry_delay_ms),
            max_delay: Duration::from_millis(config.retry_delay_ms) * MAX_BACKOFF_FACTOR,
        }
    }

    /// Wait before retry number `retry` (1-based): doubles each time, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let doublings = retry.saturating_sub(1).min(31);
        self.initial_delay
            .saturating_mul(1 << doublings)
            .min(self.max_delay)
    }
}

pub fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.status().is_some_and(is_transient_status)
}

/// Send a request, retrying transient failures.
///
/// When retries run out on a transient status the final response is still
/// returned as `Ok`, so the caller can read the upstream error body.
pub async fn with_retry<F, Fut>(policy: &RetryConfig, send: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut retry = 0;
    loop {
        let outcome = send().await;
        let transient = match &outcome {
            Ok(response) => is_transient_status(response.status()),
            Err(e) => is_transient_error(e),
        };

        if !transient || retry >= policy.max_retries {
            match &outcome {
                Ok(_) if retry > 0 => tracing::info!("Request settled after {} retries", retry),
                Err(e) if transient => {
                    tracing::error!("Giving up after {} attempts: {}", retry + 1, e)
                }
                _ => {}
            }
            return outcome;
        }

        retry += 1;
        let delay = policy.backoff(retry);
        match &outcome {
            Ok(response) => tracing::warn!(
                "Upstream returned {}, retry {}/{} in {:?}",
                response.status(),
                retry,
                policy.max_retries,
                delay
            ),
            Err(e) => tracing::warn!(
                "Request failed ({}), retry {}/{} in {:?}",
                e,
                retry,
                policy.max_retries,
                delay
            ),
        }
        tokio::time::sleep(delay).await;
    }
}
