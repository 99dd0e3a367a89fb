// Trait seams of the extraction gateway.
//
// PageFetcher turns a URL into markdown, ReviewExtractor turns markdown into
// reviews, ReviewSource is what the API layer depends on. Mocks for all three
// live in `testing` so the gateway and the router can be exercised without
// network access.

use async_trait::async_trait;

use sentinel_common::{RawReview, Result};

use crate::extractor::ExtractedReview;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page and render its main content to markdown. An empty string
    /// means the page had nothing extractable.
    async fn fetch(&self, url: &str) -> anyhow::Result<String>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait ReviewExtractor: Send + Sync {
    /// Pull review entries out of rendered page content.
    async fn extract(
        &self,
        content: &str,
        page_url: &str,
    ) -> llm_client::Result<Vec<ExtractedReview>>;
}

/// Source of raw reviews for a product page.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Extract up to `page_limit` pages of reviews starting at `url`. An empty
    /// vector is a valid outcome, not an error.
    async fn extract(&self, url: &str, page_limit: u32) -> Result<Vec<RawReview>>;
}
