use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use llm_client::OpenAi;
use sentinel_common::{RawReview, Rating};

use crate::traits::ReviewExtractor;

/// Page content beyond this many bytes is cut before prompting.
const MAX_CONTENT_BYTES: usize = 30_000;

/// Cut `content` to at most `max` bytes on a char boundary. When a line break
/// falls in the last quarter of the window the cut moves back to it, so the
/// model is not handed half of a review.
fn clip_page(content: &str, max: usize) -> &str {
    if content.len() <= max {
        return content;
    }
    let end = (0..=max)
        .rev()
        .find(|&i| content.is_char_boundary(i))
        .unwrap_or(0);
    let head = &content[..end];
    match head.rfind('\n') {
        Some(cut) if cut >= end - end / 4 => &head[..cut],
        _ => head,
    }
}

const SYSTEM_PROMPT: &str = "\
You extract customer reviews from the rendered content of a product or review page.

Return every review present on the page, in page order. For each review give:
- review_title: the review's headline, or an empty string when it has none
- review_text: the full body text of the review, verbatim
- rating: the rating as a fraction such as 4/5 or 7/10, using the scale the site uses; \
an empty string when the review shows no rating

Ignore product descriptions, questions and answers, seller replies and navigation text. \
If the page contains no reviews, return an empty list.";

/// One review as returned by the model.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct ExtractedReview {
    pub review_title: String,
    pub review_text: String,
    pub rating: String,
}

impl ExtractedReview {
    /// `None` when the entry carries no review text.
    pub fn into_raw(self) -> Option<RawReview> {
        let rating = self.rating.trim();
        let review = RawReview::new(self.review_text)
            .ok()?
            .with_title(self.review_title);
        Some(if rating.is_empty() {
            review
        } else {
            review.with_rating(Rating::from(rating))
        })
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ExtractedReviews {
    reviews: Vec<ExtractedReview>,
}

/// Review extraction through an OpenAI-compatible structured-output call.
pub struct LlmReviewExtractor {
    llm: OpenAi,
}

impl LlmReviewExtractor {
    pub fn new(llm: OpenAi) -> Self {
        info!(model = llm.model(), "Using LlmReviewExtractor");
        Self { llm }
    }
}

#[async_trait]
impl ReviewExtractor for LlmReviewExtractor {
    async fn extract(
        &self,
        content: &str,
        page_url: &str,
    ) -> llm_client::Result<Vec<ExtractedReview>> {
        let truncated = clip_page(content, MAX_CONTENT_BYTES);
        if truncated.len() < content.len() {
            warn!(
                page_url,
                bytes = content.len(),
                kept = truncated.len(),
                "Truncated page content before extraction"
            );
        }

        let user_prompt = format!(
            "Extract all reviews from this page.\n\nSource URL: {page_url}\n\n---\n\n{truncated}"
        );

        let response: ExtractedReviews = self.llm.extract(SYSTEM_PROMPT, &user_prompt).await?;

        info!(page_url, reviews = response.reviews.len(), "Extracted reviews");
        Ok(response.reviews)
    }
}
