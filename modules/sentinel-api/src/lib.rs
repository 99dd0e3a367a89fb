pub mod error;
pub mod extractors;
pub mod reviews;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

use sentinel_classifier::ReviewClassifier;
use sentinel_scout::ReviewSource;

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<ReviewClassifier>,
    pub source: Arc<dyn ReviewSource>,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter(|origin| {
            // tower-http panics on `*` combined with credentials
            let wildcard = origin.trim() == "*";
            if wildcard {
                warn!(
                    origin = origin.as_str(),
                    "Ignoring wildcard CORS origin, list origins explicitly"
                );
            }
            !wildcard
        })
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(reviews::router())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
        .with_state(state)
}
