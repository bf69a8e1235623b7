// src/google/mod.rs
//! Shared plumbing for the Google Sheets and Gmail channels

pub mod auth;

use anyhow::Result;
use std::time::Duration;
use tracing::warn;

pub use auth::{GoogleTokenProvider, ServiceAccountKey};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn retry_delay(
    attempt: u32,
    policy: &RetryPolicy,
    retry_after: Option<&reqwest::header::HeaderValue>,
) -> Duration {
    if let Some(secs) = retry_after
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        return Duration::from_secs(secs.min(30));
    }

    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    let backoff = policy
        .initial_backoff_ms
        .saturating_mul(exponent)
        .min(policy.max_backoff_ms);
    Duration::from_millis(backoff)
}

/// Send a request, retrying throttling, server errors and transport timeouts.
///
/// The final response is returned as-is; callers check the status.
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    policy: &RetryPolicy,
) -> Result<reqwest::Response> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let Some(cloned) = request.try_clone() else {
            return Ok(request.send().await?);
        };

        match cloned.send().await {
            Ok(response) => {
                let status = response.status();
                if is_retryable_status(status) && attempt < attempts {
                    let delay = retry_delay(
                        attempt,
                        policy,
                        response.headers().get(reqwest::header::RETRY_AFTER),
                    );
                    warn!(
                        "Google API retry {}/{} after status {} (sleep {:?})",
                        attempt, attempts, status, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Ok(response);
            }
            Err(err) if (err.is_timeout() || err.is_connect()) && attempt < attempts => {
                let delay = retry_delay(attempt, policy, None);
                warn!(
                    "Google API retry {}/{} after transport error: {} (sleep {:?})",
                    attempt, attempts, err, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Turn a non-success response into an error carrying the body
pub async fn ensure_success(response: reqwest::Response, api: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    anyhow::bail!("{} returned error {}: {}", api, status, error_text)
}
