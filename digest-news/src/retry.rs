//! Retrying HTTP client shared by every upstream call
//!
//! Wraps a pooled `reqwest::Client` with a bounded retry budget. A call is
//! retried on transport failures and on statuses in the policy's retryable
//! set, sleeping `backoff_base * 2^(retry-1)` between attempts. The body of
//! a 2xx response is read inside the loop, so a connection dropped mid-body
//! is a transport failure and retried like one. Any other status surfaces
//! without touching the retry budget.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::{Client, Request};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::error::UpstreamError;

/// Statuses retried when no explicit set is configured
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// Upper bound for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Idle connections kept per upstream host
const POOL_MAX_IDLE_PER_HOST: usize = 20;

/// Retry budget and backoff schedule for one upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_base: Duration,
    retry_statuses: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500), DEFAULT_RETRY_STATUS_CODES)
    }
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` attempts after the first one
    pub fn new(
        max_retries: u32,
        backoff_base: Duration,
        retry_statuses: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            max_retries,
            backoff_base,
            retry_statuses: retry_statuses.into_iter().collect(),
        }
    }

    /// A policy that issues exactly one attempt
    pub fn single_attempt() -> Self {
        Self::new(0, Duration::ZERO, [])
    }

    /// Total attempts, always at least one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sleep before retry number `retry` (1-based). Zero for the first attempt.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        1u32.checked_shl(retry - 1)
            .and_then(|factor| self.backoff_base.checked_mul(factor))
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

/// HTTP client with bounded retry and exponential backoff
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    client: Client,
    policy: RetryPolicy,
    /// Upstream name for logging purposes
    name: String,
}

impl RetryingHttpClient {
    /// Create a client with its own connection pool
    pub fn new(name: &str, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
                .build()
                .unwrap_or_else(|_| Client::new()),
            policy,
            name: name.to_string(),
        }
    }

    /// Underlying client, used to build requests for `execute`
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send `request` and decode the JSON body of the successful response
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: Request,
    ) -> Result<T, UpstreamError> {
        let body = self.execute(request).await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::MalformedResponse(e.to_string()))
    }

    /// Send `request`, retrying per policy until a success or a final failure.
    /// Returns the full body of the successful response.
    #[instrument(skip(self, request), fields(upstream = %self.name))]
    pub async fn execute(&self, request: Request) -> Result<Vec<u8>, UpstreamError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let current = request.try_clone().ok_or_else(|| {
                UpstreamError::Config("request body cannot be replayed".to_string())
            })?;

            let error = match self.client.execute(current).await {
                Ok(response) if response.status().is_success() => match response.bytes().await {
                    Ok(body) => {
                        if attempt > 1 {
                            info!(
                                "[{}] succeeded on attempt {}/{}",
                                self.name, attempt, max_attempts
                            );
                        }
                        return Ok(body.to_vec());
                    }
                    Err(e) => UpstreamError::Transport(format!("reading body: {}", e)),
                },
                Ok(response) => {
                    let status = response.status().as_u16();
                    let message = response.text().await.unwrap_or_default();
                    let error = UpstreamError::Status { status, message };
                    if !self.policy.is_retryable_status(status) {
                        debug!("[{}] status {} is not retryable", self.name, status);
                        return Err(error);
                    }
                    error
                }
                Err(e) => UpstreamError::Transport(e.to_string()),
            };

            if attempt >= max_attempts {
                warn!(
                    "[{}] giving up after {} attempt(s): {}",
                    self.name, attempt, error
                );
                return Err(error);
            }

            let delay = self.policy.backoff_for(attempt);
            warn!(
                "[{}] attempt {}/{} failed ({}), retrying in {:?}",
                self.name, attempt, max_attempts, error, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}
