//! Exponential-backoff retry policy.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ErrorKind, FwError, FwResult};

/// Policy for retry operations with exponential backoff.
///
/// `attempt` counts retries already performed, starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub use_jitter: bool,
    pub retry_on_network_error: bool,
    pub retry_on_server_error: bool,
    pub retry_on_timeout: bool,
    pub retry_on_rate_limit: bool,
    pub retry_on_client_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            use_jitter: true,
            retry_on_network_error: true,
            retry_on_server_error: true,
            retry_on_timeout: true,
            retry_on_rate_limit: true,
            retry_on_client_error: false,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            retry_on_network_error: false,
            retry_on_server_error: false,
            retry_on_timeout: false,
            retry_on_rate_limit: false,
            retry_on_client_error: false,
            ..Self::default()
        }
    }

    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2000,
            max_delay_ms: 60_000,
            ..Self::default()
        }
    }

    pub fn quick() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 500,
            max_delay_ms: 2000,
            ..Self::default()
        }
    }

    pub fn should_retry(&self, error: &FwError, attempt: u32) -> bool {
        if attempt >= self.max_attempts || !error.is_retriable() {
            return false;
        }
        match error.kind() {
            ErrorKind::Network | ErrorKind::NoInternet => self.retry_on_network_error,
            ErrorKind::Timeout => self.retry_on_timeout,
            ErrorKind::ServerError => self.retry_on_server_error,
            ErrorKind::RateLimited => self.retry_on_rate_limit,
            ErrorKind::ClientError => self.retry_on_client_error,
            _ => self.retry_on_network_error,
        }
    }

    /// Capped geometric delay before retry number `attempt + 1`, without jitter.
    pub fn base_delay_for(&self, attempt: u32) -> u64 {
        let exponential =
            self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        if !exponential.is_finite() || exponential >= self.max_delay_ms as f64 {
            self.max_delay_ms
        } else {
            exponential.max(0.0) as u64
        }
    }

    /// Delay with ±25% jitter applied when enabled.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let capped = self.base_delay_for(attempt);
        if !self.use_jitter {
            return Duration::from_millis(capped);
        }
        let range = (capped / 4) as i64;
        let offset = rand::rng().random_range(-range..=range);
        Duration::from_millis((capped as i64 + offset).max(0) as u64)
    }

    /// Run `op` until it succeeds or the policy gives up, sleeping between attempts.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> FwResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FwResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !self.should_retry(&err, attempt) {
                        if attempt > 0 {
                            warn!(attempts = attempt + 1, error_code = err.code(), "giving up after retries");
                        }
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    debug!(
                        retry_attempt = attempt + 1,
                        retry_delay_ms = delay.as_millis() as u64,
                        error_code = err.code(),
                        "retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
