use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use sentinel_common::SentinelError;

pub struct ApiError(pub SentinelError);

impl From<SentinelError> for ApiError {
    fn from(err: SentinelError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(SentinelError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            SentinelError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            SentinelError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            SentinelError::UpstreamExtraction(_) => {
                error!(error = %self.0, "Review extraction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract reviews from the given URL".to_string(),
                )
            }
            other => {
                error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
