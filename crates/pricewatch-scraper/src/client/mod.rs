//! Browser-like HTTP client shared by the retailer scrapers.

mod origin;

use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};

use crate::error::ScraperError;
use crate::rate_limit::{retry_with_backoff, RetryPolicy};

pub use origin::extract_origin;
use origin::extract_domain;

/// Desktop browser user agents. One is picked per client and kept for its
/// lifetime so a retailer sees a consistent fingerprint.
pub const USER_AGENT_POOL: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
];

/// HTTP client for retailer HTML pages.
///
/// Sends browser-like headers, pauses for a random jitter before each page
/// request, and retries transient failures per its [`RetryPolicy`]. Status
/// codes map to typed errors: 429 → [`ScraperError::RateLimited`],
/// 500/502/503/504 → [`ScraperError::ServerError`], 404 →
/// [`ScraperError::NotFound`], anything else non-2xx →
/// [`ScraperError::UnexpectedStatus`].
pub struct RetailerClient {
    client: Client,
    user_agent: &'static str,
    retry: RetryPolicy,
}

impl RetailerClient {
    /// Builds a client with the given request timeout and retry policy and a
    /// user agent drawn from [`USER_AGENT_POOL`].
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, retry: RetryPolicy) -> Result<Self, ScraperError> {
        let user_agent = USER_AGENT_POOL
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENT_POOL[0]);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(browser_headers())
            .build()?;

        Ok(Self {
            client,
            user_agent,
            retry,
        })
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent
    }

    /// Best-effort visit to the site's home page so cookies and region
    /// redirects settle before the real request.
    ///
    /// Returns the `Referer` to send on the follow-up request, or `None` if
    /// the warm-up failed. Failure is never an error.
    pub async fn warm_up(&self, page_url: &str) -> Option<String> {
        let origin = extract_origin(page_url);
        match self.client.get(&origin).send().await {
            Ok(response) => {
                tracing::debug!(origin, status = response.status().as_u16(), "warm-up done");
                tokio::time::sleep(self.retry.request_jitter()).await;
                Some(format!("{origin}/"))
            }
            Err(e) => {
                tracing::debug!(origin, error = %e, "warm-up request failed; continuing without referer");
                None
            }
        }
    }

    /// Fetches one HTML page after a jitter pause, retrying transient errors.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`]: `url` does not parse.
    /// - [`ScraperError::RateLimited`] / [`ScraperError::ServerError`]: after
    ///   all retries are exhausted.
    /// - [`ScraperError::NotFound`] / [`ScraperError::UnexpectedStatus`]: not retried.
    /// - [`ScraperError::Http`]: network or TLS failure.
    pub async fn fetch_page(&self, url: &str, referer: Option<&str>) -> Result<String, ScraperError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        tokio::time::sleep(self.retry.request_jitter()).await;

        retry_with_backoff(&self.retry, || {
            let parsed = parsed.clone();
            async move {
                let mut request = self.client.get(parsed);
                if let Some(referer) = referer {
                    request = request.header(header::REFERER, referer);
                }

                let response = request.send().await?;
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok());
                check_status(response.status(), retry_after, url)?;

                Ok(response.text().await?)
            }
        })
        .await
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-GB,en;q=0.9"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers
}

/// Maps a response status to the error taxonomy. `retry_after` is the parsed
/// `Retry-After` header in seconds, if any.
fn check_status(status: StatusCode, retry_after: Option<u64>, url: &str) -> Result<(), ScraperError> {
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        429 => Err(ScraperError::RateLimited {
            domain: extract_domain(url),
            retry_after_secs: retry_after.unwrap_or(0),
        }),
        500 | 502 | 503 | 504 => Err(ScraperError::ServerError {
            status: status.as_u16(),
            url: url.to_owned(),
        }),
        404 => Err(ScraperError::NotFound {
            url: url.to_owned(),
        }),
        other => Err(ScraperError::UnexpectedStatus {
            status: other,
            url: url.to_owned(),
        }),
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
