use thiserror::Error;

pub type Result<T> = std::result::Result<T, SentinelError>;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Extraction error: {0}")]
    UpstreamExtraction(String),

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
