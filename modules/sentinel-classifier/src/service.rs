use std::sync::Arc;

use tracing::debug;

use sentinel_common::{ClassificationResult, RawReview, Result, SentinelError};

use crate::normalizer::normalize;
use crate::scorer::Scorer;

/// Turns raw reviews into labeled results with a single batch scorer call.
#[derive(Clone)]
pub struct ReviewClassifier {
    scorer: Arc<dyn Scorer>,
}

impl ReviewClassifier {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    /// Classify `reviews` against a resolved probability `threshold`.
    ///
    /// A review is flagged (`label = true`) when its genuine probability is
    /// strictly below the threshold. Results keep input order. Either every
    /// review gets a result or the whole batch fails.
    pub fn classify_batch(
        &self,
        reviews: &[RawReview],
        threshold: f64,
    ) -> Result<Vec<ClassificationResult>> {
        if reviews.is_empty() {
            return Err(SentinelError::Validation("no reviews supplied".to_string()));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SentinelError::Validation(format!(
                "threshold must be between 0 and 1, got {threshold}"
            )));
        }

        let normalized: Vec<String> = reviews.iter().map(normalize).collect();
        let probabilities = self.scorer.score(&normalized)?;

        if probabilities.len() != reviews.len() {
            return Err(SentinelError::Scoring(format!(
                "scorer {} returned {} probabilities for {} reviews",
                self.scorer.name(),
                probabilities.len(),
                reviews.len()
            )));
        }
        if let Some(bad) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(SentinelError::Scoring(format!(
                "scorer {} returned out-of-range probability {bad}",
                self.scorer.name()
            )));
        }

        debug!(
            scorer = self.scorer.name(),
            reviews = reviews.len(),
            threshold,
            "Scored review batch"
        );

        Ok(reviews
            .iter()
            .zip(probabilities)
            .map(|(review, p)| ClassificationResult {
                review_text: review.display_text(),
                confidence: confidence_percent(p),
                label: p < threshold,
                rating: review.rating().cloned(),
            })
            .collect())
    }
}

/// Probability → integer percent, ties rounded to even.
pub fn confidence_percent(probability: f64) -> u8 {
    (probability * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}
