// Test mocks for the extraction gateway and its callers.
//
// - MockFetcher (PageFetcher): URL → markdown, errors for unknown URLs
// - MockExtractor (ReviewExtractor): content → canned entries or an LlmError
// - StaticSource (ReviewSource): fixed reviews or a fixed error, no paging

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use llm_client::LlmError;
use sentinel_common::{RawReview, Result, SentinelError};

use crate::extractor::ExtractedReview;
use crate::traits::{PageFetcher, ReviewExtractor, ReviewSource};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered URLs. Builder: `.on_page()`, `.with_delay()`,
/// `.with_page_delay()`.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    delay: Option<Duration>,
    page_delays: HashMap<String, Duration>,
    fetched: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, url: &str, markdown: &str) -> Self {
        self.pages.insert(url.to_string(), markdown.to_string());
        self
    }

    /// Sleep before every fetch (use with a paused tokio clock).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep before fetching `url` only.
    pub fn with_page_delay(mut self, url: &str, delay: Duration) -> Self {
        self.page_delays.insert(url.to_string(), delay);
        self
    }

    /// URLs requested so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(url.to_string());
        }
        if let Some(delay) = self.page_delays.get(url).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockFetcher: no page registered for {url}"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

enum Canned {
    Entries(Vec<ExtractedReview>),
    Failure(LlmError),
}

/// Keyed by page content. Unknown content yields an empty review list.
#[derive(Default)]
pub struct MockExtractor {
    replies: HashMap<String, Canned>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are `(title, text, rating)`.
    pub fn on_content(mut self, content: &str, entries: Vec<(&str, &str, &str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(title, text, rating)| ExtractedReview {
                review_title: title.to_string(),
                review_text: text.to_string(),
                rating: rating.to_string(),
            })
            .collect();
        self.replies
            .insert(content.to_string(), Canned::Entries(entries));
        self
    }

    pub fn on_error(mut self, content: &str, error: LlmError) -> Self {
        self.replies
            .insert(content.to_string(), Canned::Failure(error));
        self
    }
}

fn replay(error: &LlmError) -> LlmError {
    match error {
        LlmError::Config(m) => LlmError::Config(m.clone()),
        LlmError::Network(m) => LlmError::Network(m.clone()),
        LlmError::Api { status, message } => LlmError::Api {
            status: *status,
            message: message.clone(),
        },
        LlmError::EmptyCompletion(m) => LlmError::EmptyCompletion(m.clone()),
        LlmError::Parse(m) => LlmError::Parse(m.clone()),
    }
}

#[async_trait]
impl ReviewExtractor for MockExtractor {
    async fn extract(
        &self,
        content: &str,
        _page_url: &str,
    ) -> llm_client::Result<Vec<ExtractedReview>> {
        match self.replies.get(content) {
            Some(Canned::Entries(entries)) => Ok(entries.clone()),
            Some(Canned::Failure(error)) => Err(replay(error)),
            None => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// StaticSource
// ---------------------------------------------------------------------------

/// Hands back the same outcome for every URL and records the calls.
pub struct StaticSource {
    reviews: Vec<RawReview>,
    failure: Option<String>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl StaticSource {
    pub fn with_reviews(reviews: Vec<RawReview>) -> Self {
        Self {
            reviews,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_reviews(Vec::new())
    }

    /// Every call fails with `UpstreamExtraction(message)`.
    pub fn failing(message: &str) -> Self {
        Self {
            reviews: Vec::new(),
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(url, page_limit)` of every call so far.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReviewSource for StaticSource {
    async fn extract(&self, url: &str, page_limit: u32) -> Result<Vec<RawReview>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((url.to_string(), page_limit));
        }
        match &self.failure {
            Some(message) => Err(SentinelError::UpstreamExtraction(message.clone())),
            None => Ok(self.reviews.clone()),
        }
    }
}
