//! Bounded-retry fetch policy
//!
//! Wraps a single navigation in a retry budget with exponential backoff.
//! Transport-level failures and non-2xx statuses other than 404 are treated
//! as transient; a 404 is a valid answer about the URL and is never retried.

use crate::config::RetryConfig;
use crate::crawler::fetcher::{navigate_once, FetchError, NavigationOutcome};
use reqwest::Client;
use std::time::Duration;

/// Retry budget and backoff parameters
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Multiplier applied per retry
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            backoff_factor: config.backoff_factor,
        }
    }

    /// Delay between attempt `attempt` (1-based) and the next one
    ///
    /// With the defaults (base 1000ms, factor 1.5) the sequence is
    /// 1000ms, 1500ms, 2250ms, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let millis = (self.base_delay.as_millis() as f64 * factor).round() as u64;
        Duration::from_millis(millis)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Navigates to a URL under the retry policy
///
/// Returns the outcome of the first successful (2xx) attempt. Anything else
/// ends in [`FetchError::NavigationFailed`], which carries the last observed
/// redirect chain so the frontier can mark the whole lineage unreachable.
pub async fn navigate_with_retry(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
    max_redirects: u32,
) -> Result<NavigationOutcome, FetchError> {
    let mut last_error = String::from("no attempts made");
    let mut last_chain: Vec<String> = Vec::new();

    for attempt in 1..=policy.max_attempts {
        match navigate_once(client, url, max_redirects).await {
            Ok(outcome) if outcome.is_success() => return Ok(outcome),

            Ok(outcome) if outcome.status == 404 => {
                // Terminal: the server answered definitively
                return Err(FetchError::NavigationFailed {
                    url: url.to_string(),
                    attempts: attempt,
                    last_error: "HTTP 404".to_string(),
                    redirect_chain: outcome.redirect_chain,
                });
            }

            Ok(outcome) => {
                last_error = format!("HTTP {}", outcome.status);
                last_chain = outcome.redirect_chain;
            }

            Err(
                e @ (FetchError::RedirectLoop { .. }
                | FetchError::RedirectLimit { .. }
                | FetchError::MissingLocation { .. }
                | FetchError::InvalidRedirect { .. }),
            ) => {
                // Deterministic failures don't improve with retries
                return Err(FetchError::NavigationFailed {
                    url: url.to_string(),
                    attempts: attempt,
                    last_error: e.to_string(),
                    redirect_chain: last_chain,
                });
            }

            Err(e) => {
                last_error = e.to_string();
            }
        }

        if attempt < policy.max_attempts {
            let delay = policy.delay_after(attempt);
            tracing::debug!(
                "Retrying {} in {:?} (attempt {}/{}): {}",
                url,
                delay,
                attempt,
                policy.max_attempts,
                last_error
            );
            tokio::time::sleep(delay).await;
        }
    }

    Err(FetchError::NavigationFailed {
        url: url.to_string(),
        attempts: policy.max_attempts,
        last_error,
        redirect_chain: last_chain,
    })
}
