use serde::Deserialize;

use sentinel_common::{Rating, Threshold, Tier};

#[derive(Debug, Deserialize)]
pub struct AnalyzeReviewsRequest {
    pub url: String,
    #[serde(default)]
    pub threshold: Threshold,
    pub page_limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SingleReviewRequest {
    pub review: String,
    #[serde(default)]
    pub threshold: Threshold,
    pub rating: Rating,
}

/// Public endpoint: only the named tiers are accepted.
#[derive(Debug, Deserialize)]
pub struct VerifyReviewRequest {
    pub review: String,
    #[serde(default)]
    pub threshold: Tier,
}
