// src/scan/fetch.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::StatusCode;
use tracing::warn;

pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(30);
pub const SECONDARY_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Injectable pause so tests can record the backoff schedule instead of
/// actually waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, d: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}

/// HTTP fetcher with bounded retries and exponential backoff. Sends a
/// browser-like header set; some funding portals serve bot UAs a 403.
pub struct Fetcher {
    client: reqwest::Client,
    sleeper: Arc<dyn Sleeper>,
}

struct AttemptError {
    retryable: bool,
    source: anyhow::Error,
}

impl Fetcher {
    pub fn new(sleeper: Arc<dyn Sleeper>) -> Self {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .build()
            .expect("reqwest client");
        Self { client, sleeper }
    }

    /// Fetch `url`, making up to `max_retries` attempts. Retryable failures
    /// (transport errors, 408/429/5xx) sleep `2^attempt` seconds before the
    /// next try; other HTTP errors fail immediately. Redirects are followed.
    pub async fn fetch(&self, url: &str, timeout: Duration, max_retries: u32) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            match self.attempt(url, timeout).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    if !e.retryable || attempt >= max_retries {
                        return Err(e.source.context(format!("fetching {url}")));
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    warn!(
                        url,
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        "fetch attempt failed, backing off"
                    );
                    self.sleeper.sleep(backoff).await;
                }
            }
        }
    }

    async fn attempt(&self, url: &str, timeout: Duration) -> std::result::Result<String, AttemptError> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AttemptError {
                // Transport-level problems (connect, timeout, redirect loop)
                // are all worth another try.
                retryable: true,
                source: anyhow::Error::from(e),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AttemptError {
                retryable: is_retryable_status(status),
                source: anyhow!("HTTP {status}"),
            });
        }

        resp.text().await.map_err(|e| AttemptError {
            retryable: true,
            source: anyhow::Error::from(e),
        })
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5,fr;q=0.3"),
    );
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers
}
