//! Reusable HTTP client with a bounded retry policy.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// A reqwest client that retries transient failures.
///
/// Retries cover connection-level errors and a fixed set of status codes
/// (500, 502, 503, 504 by default), up to `retry_attempts` tries with
/// exponential backoff. Any other non-success status fails immediately.
pub struct RetryingClient {
    client: Client,
    retry_attempts: u32,
    retry_backoff: Duration,
    retryable_statuses: Vec<u16>,
}

impl RetryingClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            retry_attempts: config.retry_attempts,
            retry_backoff: config.retry_backoff,
            retryable_statuses: config.retryable_statuses.clone(),
        })
    }

    /// Fetches `url` and returns the response body as text, following
    /// redirects. `timeout` overrides the client default per call.
    pub async fn get_text(&self, url: &Url, timeout: Duration) -> Result<String> {
        let mut last_error: Option<AppError> = None;

        for attempt in 0..self.retry_attempts {
            if attempt > 0 {
                // backoff_factor * 2^(attempt-1), matching common adapter policies
                let backoff = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
                tracing::debug!(target: "http",
                    "Retrying {} (attempt {}/{}) after {:?}", url, attempt + 1, self.retry_attempts, backoff);
                tokio::time::sleep(backoff).await;
            }

            let response = match self
                .client
                .get(url.clone())
                .timeout(timeout)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(target: "http", "Transport error fetching {}: {}", url, e);
                    last_error = Some(e.into());
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response.text().await?);
            }
            if self.retryable_statuses.contains(&status.as_u16()) {
                tracing::debug!(target: "http", "Retryable status {} fetching {}", status, url);
                last_error = Some(AppError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
                continue;
            }
            // Non-retryable failure status: give up on this path now.
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Err(last_error.unwrap_or_else(|| AppError::HttpStatus {
            status: 0,
            url: url.to_string(),
        }))
    }
}
