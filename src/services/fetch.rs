//! HTTP Page Fetcher
//!
//! Plain-HTTP markup retrieval with a browser-like user agent and a bounded
//! timeout. Failures propagate: the static extraction path has no internal
//! fallback of its own, the orchestrator's chain is the recovery mechanism.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

use crate::error::{HeropickError, Result};
use crate::types::FetchConfig;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct ReqwestFetcher {
    client: Client,
    cfg: FetchConfig,
}

impl ReqwestFetcher {
    pub fn new(cfg: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;
        Ok(Self { client, cfg })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.cfg.user_agent)
                .unwrap_or(HeaderValue::from_static("Mozilla/5.0")),
        );
        headers
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    fn name(&self) -> &'static str {
        "reqwest"
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).headers(self.headers()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HeropickError::fetch_error(
                url,
                &format!("HTTP status {}", status),
            ));
        }
        Ok(resp.text().await?)
    }
}
