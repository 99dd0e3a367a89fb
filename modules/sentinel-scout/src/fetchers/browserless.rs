use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::page_markdown;
use crate::traits::PageFetcher;

/// Renders pages through a Browserless `/content` endpoint, for sites that
/// only produce their reviews client-side.
pub struct BrowserlessFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessFetcher {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        info!(base_url, "Using BrowserlessFetcher");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    async fn content(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .context("Browserless content request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("Browserless returned {status}: {message}");
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl PageFetcher for BrowserlessFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        info!(url, fetcher = "browserless", "Fetching page");

        let html = self.content(url).await?;
        Ok(page_markdown(html.as_bytes(), url, "browserless"))
    }

    fn name(&self) -> &str {
        "browserless"
    }
}
