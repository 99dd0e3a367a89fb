use axum::extract::State;
use axum::Json;
use tracing::info;

use sentinel_common::{RawReview, SentinelError};
use sentinel_scout::ReviewSource;

use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::AppState;

use super::requests::{AnalyzeReviewsRequest, SingleReviewRequest, VerifyReviewRequest};
use super::responses::AnalyzeResponse;

pub async fn analyze_reviews(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AnalyzeReviewsRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let threshold = body.threshold.resolve()?;
    let page_limit = match body.page_limit {
        Some(0) => {
            return Err(ApiError(SentinelError::Validation(
                "page_limit must be at least 1".to_string(),
            )))
        }
        Some(n) => n.min(state.max_page_limit),
        None => state.default_page_limit,
    };

    info!(url = %body.url, threshold, page_limit, "Analyzing reviews for URL");

    let reviews = state.source.extract(&body.url, page_limit).await?;
    if reviews.is_empty() {
        return Err(ApiError(SentinelError::NotFound(
            "No reviews found.".to_string(),
        )));
    }

    let analyzed_reviews = state.classifier.classify_batch(&reviews, threshold)?;
    info!(
        url = %body.url,
        count = analyzed_reviews.len(),
        flagged = analyzed_reviews.iter().filter(|r| r.label).count(),
        "Analysis complete"
    );

    Ok(Json(AnalyzeResponse { analyzed_reviews }))
}

pub async fn analyze_single_review(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SingleReviewRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let threshold = body.threshold.resolve()?;
    // The empty title is kept so the echoed text reads " : {review}".
    let review = RawReview::new(body.review)?
        .with_title("")
        .with_rating(body.rating);

    let analyzed_reviews = state.classifier.classify_batch(&[review], threshold)?;
    Ok(Json(AnalyzeResponse { analyzed_reviews }))
}

pub async fn verify_review(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VerifyReviewRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let review = RawReview::new(body.review)?;

    let analyzed_reviews = state
        .classifier
        .classify_batch(&[review], body.threshold.probability())?;
    Ok(Json(AnalyzeResponse { analyzed_reviews }))
}
