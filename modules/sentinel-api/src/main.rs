use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use llm_client::OpenAi;
use sentinel_api::{build_router, AppState};
use sentinel_classifier::{LinearTextModel, ReviewClassifier};
use sentinel_common::AppConfig;
use sentinel_scout::{
    BrowserlessFetcher, HttpFetcher, LlmReviewExtractor, PageFetcher, ReviewGateway,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting sentinel-api");

    let config = AppConfig::from_env()?;

    // The model is loaded once; a missing or corrupt artifact aborts startup.
    let model = LinearTextModel::load(&config.model_path, &config.genuine_class_label)?;
    let classifier = Arc::new(ReviewClassifier::new(Arc::new(model)));

    let mut llm = OpenAi::new(&config.openai_api_key, &config.openai_model)
        .with_timeout(config.extraction_timeout)?;
    if let Some(ref base_url) = config.openai_base_url {
        llm = llm.with_base_url(base_url);
    }

    // Browserless when configured, plain HTTP otherwise
    let fetcher: Arc<dyn PageFetcher> = match config.browserless_url {
        Some(ref url) => Arc::new(BrowserlessFetcher::new(
            url,
            config.browserless_token.as_deref(),
            config.fetch_timeout,
        )?),
        None => Arc::new(HttpFetcher::new(config.fetch_timeout)?),
    };

    let gateway = ReviewGateway::new(fetcher, Arc::new(LlmReviewExtractor::new(llm)))
        .with_page_pattern(&config.page_pattern)
        .with_max_page_limit(config.max_page_limit)
        .with_timeout(config.extraction_timeout);

    let state = AppState {
        classifier,
        source: Arc::new(gateway),
        default_page_limit: config.page_limit,
        max_page_limit: config.max_page_limit,
    };
    let app = build_router(state, &config.allowed_origins);

    let addr = config.bind_addr();
    info!(addr, "Listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
