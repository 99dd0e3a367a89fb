use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use llm_client::LlmError;
use sentinel_common::{RawReview, Result, SentinelError};

use crate::traits::{PageFetcher, ReviewExtractor, ReviewSource};
use crate::url_guard::validate_url;

pub const DEFAULT_PAGE_PATTERN: &str = "{url}-page-{page}";
const DEFAULT_MAX_PAGE_LIMIT: u32 = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// URL of page `page` (1-based). Page 1 is always the base URL itself.
pub fn page_url(pattern: &str, base: &str, page: u32) -> String {
    if page <= 1 {
        return base.to_string();
    }
    pattern
        .replace("{url}", base)
        .replace("{page}", &page.to_string())
}

/// Fetch → extract loop over the pages of a review listing.
pub struct ReviewGateway {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn ReviewExtractor>,
    page_pattern: String,
    max_page_limit: u32,
    timeout: Duration,
}

enum PageOutcome {
    Reviews(Vec<RawReview>),
    Exhausted,
    Skipped,
}

impl ReviewGateway {
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: Arc<dyn ReviewExtractor>) -> Self {
        Self {
            fetcher,
            extractor,
            page_pattern: DEFAULT_PAGE_PATTERN.to_string(),
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_page_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.page_pattern = pattern.into();
        self
    }

    pub fn with_max_page_limit(mut self, max: u32) -> Self {
        self.max_page_limit = max.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pages share one deadline. Running out of time on page 1 is an error;
    /// later pages end the run with whatever was already collected.
    async fn collect(&self, base: &str, pages: u32) -> Result<Vec<RawReview>> {
        let deadline = Instant::now() + self.timeout;
        let mut reviews = Vec::new();

        for page in 1..=pages {
            let url = page_url(&self.page_pattern, base, page);
            let outcome = tokio::time::timeout_at(deadline, self.scrape_page(&url))
                .await
                .unwrap_or_else(|_| {
                    Err(anyhow::anyhow!("timed out after {}s", self.timeout.as_secs()))
                });

            match outcome {
                Ok(PageOutcome::Reviews(found)) => {
                    debug!(url, page, count = found.len(), "Page yielded reviews");
                    reviews.extend(found);
                }
                Ok(PageOutcome::Exhausted) => {
                    info!(url, page, "No more reviews, stopping");
                    break;
                }
                Ok(PageOutcome::Skipped) => continue,
                Err(e) if page == 1 => {
                    error!(url, error = format!("{e:#}"), "Extraction failed on first page");
                    return Err(SentinelError::UpstreamExtraction(format!("{e:#}")));
                }
                Err(e) => {
                    warn!(
                        url,
                        page,
                        error = format!("{e:#}"),
                        "Extraction failed, keeping earlier pages"
                    );
                    break;
                }
            }
        }

        Ok(reviews)
    }

    async fn scrape_page(&self, url: &str) -> anyhow::Result<PageOutcome> {
        let content = self.fetcher.fetch(url).await?;
        if content.trim().is_empty() {
            return Ok(PageOutcome::Exhausted);
        }

        let entries = match self.extractor.extract(&content, url).await {
            Ok(entries) => entries,
            Err(e @ (LlmError::Parse(_) | LlmError::EmptyCompletion(_))) => {
                warn!(url, error = %e, "Unusable extraction reply, skipping page");
                return Ok(PageOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        let total = entries.len();
        let reviews: Vec<RawReview> = entries
            .into_iter()
            .filter_map(|entry| entry.into_raw())
            .collect();
        if reviews.len() < total {
            warn!(
                url,
                dropped = total - reviews.len(),
                "Dropped extracted entries without review text"
            );
        }

        if reviews.is_empty() {
            Ok(PageOutcome::Exhausted)
        } else {
            Ok(PageOutcome::Reviews(reviews))
        }
    }
}

#[async_trait]
impl ReviewSource for ReviewGateway {
    async fn extract(&self, url: &str, page_limit: u32) -> Result<Vec<RawReview>> {
        if page_limit == 0 {
            return Err(SentinelError::Validation(
                "page_limit must be at least 1".to_string(),
            ));
        }
        let parsed = validate_url(url)?;
        let base = url.trim();
        let pages = page_limit.min(self.max_page_limit);

        info!(
            url = parsed.as_str(),
            pages,
            fetcher = self.fetcher.name(),
            "Extracting reviews"
        );

        let reviews = self.collect(base, pages).await?;

        info!(url = base, count = reviews.len(), "Extraction complete");
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use sentinel_common::Rating;

    use super::*;
    use crate::testing::{MockExtractor, MockFetcher};

    const BASE: &str = "https://shop.example.com/product/42";

    fn page(n: u32) -> String {
        page_url(DEFAULT_PAGE_PATTERN, BASE, n)
    }

    fn gateway(fetcher: MockFetcher, extractor: MockExtractor) -> ReviewGateway {
        ReviewGateway::new(Arc::new(fetcher), Arc::new(extractor))
    }

    #[test]
    fn page_urls_follow_pattern() {
        assert_eq!(page(1), BASE);
        assert_eq!(page(2), "https://shop.example.com/product/42-page-2");
        assert_eq!(
            page_url("{url}?page={page}", "https://a.example/r", 3),
            "https://a.example/r?page=3"
        );
    }

    #[tokio::test]
    async fn single_page_by_default_limit() {
        let fetcher = MockFetcher::new().on_page(&page(1), "# Reviews").on_page(&page(2), "# More");
        let extractor = MockExtractor::new()
            .on_content("# Reviews", vec![("Good", "Works great", "5/5")])
            .on_content("# More", vec![("Bad", "Broke fast", "1/5")]);

        let reviews = gateway(fetcher, extractor).extract(BASE, 1).await.unwrap();

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].display_text(), "Good : Works great");
        assert_eq!(reviews[0].rating(), Some(&Rating::from("5/5")));
    }

    #[tokio::test]
    async fn pages_concatenate_in_order() {
        let fetcher = MockFetcher::new()
            .on_page(&page(1), "p1")
            .on_page(&page(2), "p2")
            .on_page(&page(3), "p3");
        let extractor = MockExtractor::new()
            .on_content("p1", vec![("", "one", ""), ("", "two", "")])
            .on_content("p2", vec![("", "three", "")])
            .on_content("p3", vec![("", "four", "")]);

        let reviews = gateway(fetcher, extractor).extract(BASE, 3).await.unwrap();

        let texts: Vec<&str> = reviews.iter().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["one", "two", "three", "four"]);
    }

    #[tokio::test]
    async fn stops_on_empty_page() {
        let fetcher = MockFetcher::new()
            .on_page(&page(1), "p1")
            .on_page(&page(2), "")
            .on_page(&page(3), "p3");
        let extractor = MockExtractor::new()
            .on_content("p1", vec![("", "one", "")])
            .on_content("p3", vec![("", "three", "")]);

        let reviews = gateway(fetcher, extractor).extract(BASE, 5).await.unwrap();

        assert_eq!(reviews.len(), 1);
    }

    #[tokio::test]
    async fn stops_when_page_has_no_reviews() {
        let fetcher = MockFetcher::new().on_page(&page(1), "p1").on_page(&page(2), "p2");
        let extractor = MockExtractor::new()
            .on_content("p1", vec![])
            .on_content("p2", vec![("", "late", "")]);

        let reviews = gateway(fetcher, extractor).extract(BASE, 2).await.unwrap();

        assert!(reviews.is_empty());
    }

    #[tokio::test]
    async fn unparseable_reply_skips_page() {
        let fetcher = MockFetcher::new().on_page(&page(1), "p1").on_page(&page(2), "p2");
        let extractor = MockExtractor::new()
            .on_error("p1", LlmError::Parse("not json".into()))
            .on_content("p2", vec![("", "second page", "")]);

        let reviews = gateway(fetcher, extractor).extract(BASE, 2).await.unwrap();

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text(), "second page");
    }

    #[tokio::test]
    async fn blank_entries_dropped() {
        let fetcher = MockFetcher::new().on_page(&page(1), "p1");
        let extractor =
            MockExtractor::new().on_content("p1", vec![("T", "  ", "3/5"), ("", "kept", "")]);

        let reviews = gateway(fetcher, extractor).extract(BASE, 1).await.unwrap();

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text(), "kept");
    }

    #[tokio::test]
    async fn first_page_transport_failure_is_upstream_error() {
        let fetcher = MockFetcher::new();
        let extractor = MockExtractor::new();

        let err = gateway(fetcher, extractor).extract(BASE, 2).await.unwrap_err();

        assert!(matches!(err, SentinelError::UpstreamExtraction(_)));
    }

    #[tokio::test]
    async fn first_page_llm_failure_is_upstream_error() {
        let fetcher = MockFetcher::new().on_page(&page(1), "p1");
        let extractor = MockExtractor::new().on_error(
            "p1",
            LlmError::Api {
                status: 503,
                message: "overloaded".into(),
            },
        );

        let err = gateway(fetcher, extractor).extract(BASE, 1).await.unwrap_err();

        assert!(matches!(err, SentinelError::UpstreamExtraction(_)));
    }

    #[tokio::test]
    async fn later_failure_keeps_partial_result() {
        // page 2 is not registered, so the fetcher errors on it
        let fetcher = MockFetcher::new().on_page(&page(1), "p1");
        let extractor = MockExtractor::new().on_content("p1", vec![("", "one", "")]);

        let reviews = gateway(fetcher, extractor).extract(BASE, 3).await.unwrap();

        assert_eq!(reviews.len(), 1);
    }

    #[tokio::test]
    async fn page_limit_capped_by_max() {
        let fetcher = MockFetcher::new()
            .on_page(&page(1), "p1")
            .on_page(&page(2), "p2")
            .on_page(&page(3), "p3");
        let extractor = MockExtractor::new()
            .on_content("p1", vec![("", "one", "")])
            .on_content("p2", vec![("", "two", "")])
            .on_content("p3", vec![("", "three", "")]);

        let reviews = gateway(fetcher, extractor)
            .with_max_page_limit(2)
            .extract(BASE, 50)
            .await
            .unwrap();

        assert_eq!(reviews.len(), 2);
    }

    #[tokio::test]
    async fn zero_page_limit_rejected() {
        let err = gateway(MockFetcher::new(), MockExtractor::new())
            .extract(BASE, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, SentinelError::Validation(_)));
    }

    #[tokio::test]
    async fn invalid_url_rejected_before_fetch() {
        let fetcher = Arc::new(MockFetcher::new());
        let gateway = ReviewGateway::new(fetcher.clone(), Arc::new(MockExtractor::new()));

        let err = gateway.extract("http://localhost/admin", 1).await.unwrap_err();

        assert!(matches!(err, SentinelError::Validation(_)));
        assert!(fetcher.fetched().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_first_page_times_out() {
        let fetcher = MockFetcher::new()
            .on_page(&page(1), "p1")
            .with_delay(Duration::from_secs(60));
        let extractor = MockExtractor::new().on_content("p1", vec![("", "one", "")]);

        let err = gateway(fetcher, extractor)
            .with_timeout(Duration::from_secs(5))
            .extract(BASE, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, SentinelError::UpstreamExtraction(msg) if msg.contains("timed out")));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_later_page_keeps_earlier_reviews() {
        let fetcher = MockFetcher::new()
            .on_page(&page(1), "p1")
            .on_page(&page(2), "p2")
            .with_page_delay(&page(2), Duration::from_secs(600));
        let extractor = MockExtractor::new()
            .on_content("p1", vec![("", "one", "")])
            .on_content("p2", vec![("", "two", "")]);

        let reviews = gateway(fetcher, extractor)
            .with_timeout(Duration::from_secs(5))
            .extract(BASE, 2)
            .await
            .unwrap();

        let texts: Vec<&str> = reviews.iter().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["one"]);
    }
}
