//! HTTP navigation for the crawler
//!
//! Redirects are followed manually so the full chain stays observable: the
//! frontier needs every intermediate URL to classify redirect lineage, and
//! reqwest's automatic policy would hide it.

use crate::config::UserAgentConfig;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while navigating to a URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("Redirect loop detected at {url}")]
    RedirectLoop { url: String },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Redirect from {url} carried no Location header")]
    MissingLocation { url: String },

    #[error("Invalid redirect target from {url}: {message}")]
    InvalidRedirect { url: String, message: String },

    #[error("Navigation failed for {url} after {attempts} attempt(s): {last_error}")]
    NavigationFailed {
        url: String,
        attempts: u32,
        last_error: String,
        /// Redirect chain observed on the last attempt, if any
        redirect_chain: Vec<String>,
    },
}

/// Result of one complete navigation (all redirects followed)
#[derive(Debug, Clone)]
pub struct NavigationOutcome {
    /// Final HTTP status code
    pub status: u16,

    /// URLs that redirected on the way, in order; excludes the final URL
    pub redirect_chain: Vec<String>,

    /// The URL the navigation settled on
    pub final_url: String,

    /// Response body; only read for successful responses
    pub html: String,
}

impl NavigationOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Builds the HTTP client used for all fetches
///
/// Redirects are disabled here and handled in [`navigate_once`]. Plain http
/// is allowed because loopback development crawls never upgrade to https.
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs a single navigation attempt, following redirects manually
///
/// Up to `max_redirects` hops are followed; revisiting a URL in the chain
/// fails as a redirect loop. The body is only read for 2xx responses; a
/// non-2xx status is returned as a valid outcome and left to the retry
/// policy to judge.
pub async fn navigate_once(
    client: &Client,
    url: &str,
    max_redirects: u32,
) -> Result<NavigationOutcome, FetchError> {
    let mut chain: Vec<String> = Vec::new();
    let mut current = url.to_string();

    loop {
        let response = client
            .get(&current)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: current.clone(),
                source: e,
            })?;

        let status = response.status();

        if status.is_redirection() {
            if chain.len() as u32 >= max_redirects {
                return Err(FetchError::RedirectLimit {
                    url: url.to_string(),
                });
            }

            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| FetchError::MissingLocation {
                    url: current.clone(),
                })?;

            let base = Url::parse(&current).map_err(|e| FetchError::InvalidRedirect {
                url: current.clone(),
                message: e.to_string(),
            })?;
            let next = base
                .join(location)
                .map_err(|e| FetchError::InvalidRedirect {
                    url: current.clone(),
                    message: e.to_string(),
                })?
                .to_string();

            if next == current || chain.contains(&next) {
                return Err(FetchError::RedirectLoop { url: next });
            }

            chain.push(current);
            current = next;
            continue;
        }

        let html = if status.is_success() {
            response.text().await.map_err(|e| FetchError::Transport {
                url: current.clone(),
                source: e,
            })?
        } else {
            String::new()
        };

        return Ok(NavigationOutcome {
            status: status.as_u16(),
            redirect_chain: chain,
            final_url: current,
            html,
        });
    }
}
