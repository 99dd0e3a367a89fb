pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::post;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/analyze-reviews", post(handlers::analyze_reviews))
        .route("/api/analyze-single-review", post(handlers::analyze_single_review))
        .route("/api/openapi-verify-review", post(handlers::verify_review))
}
