use serde::Serialize;

use sentinel_common::ClassificationResult;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analyzed_reviews: Vec<ClassificationResult>,
}
