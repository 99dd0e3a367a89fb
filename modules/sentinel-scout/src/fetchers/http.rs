use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::{info, warn};

use super::page_markdown;
use crate::traits::PageFetcher;
use crate::url_guard::check_redirect;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; ReviewSentinel/0.1)";

/// Plain GET + markdown conversion. No JavaScript rendering.
///
/// Every redirect hop is re-checked against the URL guard.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(guarded_redirects())
            .build()
            .context("Failed to build HTTP client")?;
        info!(timeout_secs = timeout.as_secs(), "Using HttpFetcher");
        Ok(Self { client })
    }
}

fn guarded_redirects() -> Policy {
    Policy::custom(|attempt| {
        match check_redirect(attempt.url(), attempt.previous().len()) {
            Ok(()) => attempt.follow(),
            Err(e) => {
                warn!(to = %attempt.url(), error = %e, "Redirect blocked");
                attempt.error(e)
            }
        }
    })
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        info!(url, fetcher = "http", "Fetching page");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("Page request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Page request returned {status}");
        }

        let html = resp.bytes().await.context("Failed to read page body")?;
        Ok(page_markdown(&html, url, "http"))
    }

    fn name(&self) -> &str {
        "http"
    }
}
