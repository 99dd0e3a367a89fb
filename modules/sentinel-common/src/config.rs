use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, SentinelError};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server
    pub host: String,
    pub port: u16,

    // AI / LLM
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: Option<String>,

    // Classifier
    pub model_path: String,
    pub genuine_class_label: String,

    // Scraping
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub page_limit: u32,
    pub max_page_limit: u32,
    pub page_pattern: String,
    pub extraction_timeout: Duration,
    pub fetch_timeout: Duration,

    // CORS
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed_or("API_PORT", 8000)?,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_base_url: optional("OPENAI_BASE_URL"),
            model_path: env::var("FAKE_REVIEW_MODEL_PATH")
                .unwrap_or_else(|_| "models/fake_review_model.json".to_string()),
            genuine_class_label: env::var("GENUINE_CLASS_LABEL")
                .unwrap_or_else(|_| "OR".to_string()),
            browserless_url: optional("BROWSERLESS_URL"),
            browserless_token: optional("BROWSERLESS_TOKEN"),
            page_limit: parsed_or("EXTRACTION_PAGE_LIMIT", 1)?,
            max_page_limit: parsed_or("EXTRACTION_MAX_PAGE_LIMIT", 10)?,
            page_pattern: env::var("EXTRACTION_PAGE_PATTERN")
                .unwrap_or_else(|_| "{url}-page-{page}".to_string()),
            extraction_timeout: Duration::from_secs(parsed_or("EXTRACTION_TIMEOUT_SECS", 120)?),
            fetch_timeout: Duration::from_secs(parsed_or("FETCH_TIMEOUT_SECS", 30)?),
            allowed_origins: parse_origins(
                &env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks that `from_env` cannot express per variable.
    pub fn validate(&self) -> Result<()> {
        if self.page_limit == 0 || self.max_page_limit == 0 {
            return Err(SentinelError::Config(
                "page limits must be at least 1".to_string(),
            ));
        }
        if self.page_limit > self.max_page_limit {
            return Err(SentinelError::Config(format!(
                "EXTRACTION_PAGE_LIMIT ({}) exceeds EXTRACTION_MAX_PAGE_LIMIT ({})",
                self.page_limit, self.max_page_limit
            )));
        }
        if !self.page_pattern.contains("{page}") {
            return Err(SentinelError::Config(
                "EXTRACTION_PAGE_PATTERN must contain {page}".to_string(),
            ));
        }
        if self.allowed_origins.iter().any(|origin| origin.trim() == "*") {
            return Err(SentinelError::Config(
                "ALLOWED_ORIGINS cannot contain \"*\" (credentials are allowed), list origins explicitly"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| SentinelError::Config(format!("{key} environment variable is required")))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SentinelError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
