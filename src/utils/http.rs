// src/utils/http.rs

//! HTTP fetching and request pacing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, REFERER};

use crate::error::{AppError, Result};
use crate::parsers::RawContent;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/106.0.0.0 Safari/537.36";

/// Fetches one URL and returns its body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue a single request. No retries.
    async fn fetch(&self, url: &str) -> Result<RawContent>;
}

/// Browser-like HTTP client used for every site.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: reqwest::Client,
}

impl FetchClient {
    /// Create a client carrying the static browser header set.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(browser_headers())
            .build()?;
        Ok(Self { client })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(
            "\" Not A;Brand\";v=\"99\", \"Chromium\";v=\"106\", \"Google Chrome\";v=\"106\"",
        ),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"macOS\""),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-site"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers
}

#[async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, url: &str) -> Result<RawContent> {
        let response = self
            .client
            .get(url)
            .header(REFERER, url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: url.to_string(),
                status,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));

        let text = response.text().await.map_err(|e| AppError::fetch(url, e))?;

        if is_json {
            if let Ok(value) = serde_json::from_str(&text) {
                return Ok(RawContent::Json(value));
            }
        }
        Ok(RawContent::Text(text))
    }
}

/// Enforces a fixed pause between outbound requests.
///
/// Shared by every scan kind. Only the very first request of the process
/// goes out without waiting.
#[derive(Debug)]
pub struct RequestPacer {
    interval: Duration,
    started: AtomicBool,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: AtomicBool::new(false),
        }
    }

    /// Wait until the next request may be sent.
    pub async fn wait_turn(&self) {
        let first = !self.started.swap(true, Ordering::SeqCst);
        if !first && !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}
