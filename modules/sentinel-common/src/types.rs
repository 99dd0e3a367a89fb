use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};

/// Threshold used by the analyze endpoints when the caller sends none.
pub const DEFAULT_NUMERIC_THRESHOLD: f64 = 0.7;

// --- Rating ---

/// A review rating as scraped or submitted: free text ("4/5",
/// "5.0 out of 5 stars") or a bare integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Number(i64),
    Text(String),
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Number(n) => write!(f, "{n}"),
            Rating::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Rating {
    fn from(s: &str) -> Self {
        Rating::Text(s.to_string())
    }
}

impl From<i64> for Rating {
    fn from(n: i64) -> Self {
        Rating::Number(n)
    }
}

// --- RawReview ---

/// One review as obtained from extraction or from a direct submission.
///
/// An absent title and an empty title are different things: only a present
/// title contributes the `"{title} : "` prefix to the display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReview {
    title: Option<String>,
    text: String,
    rating: Option<Rating>,
}

impl RawReview {
    /// Fails when `text` is empty or whitespace only.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SentinelError::Validation(
                "review text must not be empty".to_string(),
            ));
        }
        Ok(Self {
            title: None,
            text,
            rating: None,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rating(&self) -> Option<&Rating> {
        self.rating.as_ref()
    }

    /// Text echoed back to the caller in a result.
    pub fn display_text(&self) -> String {
        match &self.title {
            Some(title) => format!("{title} : {}", self.text),
            None => self.text.clone(),
        }
    }
}

// --- Threshold ---

/// Symbolic sensitivity tiers accepted by the public verify endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    #[default]
    Medium,
    Low,
}

impl Tier {
    pub fn probability(self) -> f64 {
        match self {
            Tier::High => 0.9,
            Tier::Medium => 0.75,
            Tier::Low => 0.65,
        }
    }
}

impl FromStr for Tier {
    type Err = SentinelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "high" => Ok(Tier::High),
            "medium" => Ok(Tier::Medium),
            "low" => Ok(Tier::Low),
            other => Err(SentinelError::Validation(format!(
                "unknown threshold tier '{other}' (expected high, medium or low)"
            ))),
        }
    }
}

/// Either a raw probability or a named tier. Resolved to a probability
/// before it reaches the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "ThresholdRepr")]
pub enum Threshold {
    Numeric(f64),
    Tier(Tier),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ThresholdRepr {
    Number(f64),
    Name(String),
}

impl TryFrom<ThresholdRepr> for Threshold {
    type Error = SentinelError;

    fn try_from(repr: ThresholdRepr) -> Result<Self> {
        match repr {
            ThresholdRepr::Number(value) => Ok(Threshold::Numeric(value)),
            ThresholdRepr::Name(name) => name.parse().map(Threshold::Tier),
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Numeric(DEFAULT_NUMERIC_THRESHOLD)
    }
}

impl Threshold {
    /// Map to a probability in `[0, 1]`.
    pub fn resolve(self) -> Result<f64> {
        match self {
            Threshold::Tier(tier) => Ok(tier.probability()),
            Threshold::Numeric(value) if (0.0..=1.0).contains(&value) => Ok(value),
            Threshold::Numeric(value) => Err(SentinelError::Validation(format!(
                "threshold must be between 0 and 1, got {value}"
            ))),
        }
    }
}

// --- ClassificationResult ---

/// Outcome for one review. `label` is true when the review is flagged as
/// likely fake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub review_text: String,
    pub confidence: u8,
    pub label: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_mapping_is_exact() {
        assert_eq!(Tier::High.probability(), 0.9);
        assert_eq!(Tier::Medium.probability(), 0.75);
        assert_eq!(Tier::Low.probability(), 0.65);
    }

    #[test]
    fn threshold_accepts_number_or_tier_name() {
        let t: Threshold = serde_json::from_str("0.42").unwrap();
        assert_eq!(t, Threshold::Numeric(0.42));

        let t: Threshold = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(t.resolve().unwrap(), 0.9);
    }

    #[test]
    fn unknown_tier_is_rejected_on_deserialize() {
        let err = serde_json::from_str::<Threshold>("\"extreme\"").unwrap_err();
        assert!(err.to_string().contains("unknown threshold tier 'extreme'"));
    }

    #[test]
    fn tier_names_are_case_sensitive() {
        assert!("High".parse::<Tier>().is_err());
        assert_eq!("low".parse::<Tier>().unwrap(), Tier::Low);
    }

    #[test]
    fn numeric_threshold_range_checked() {
        assert_eq!(Threshold::Numeric(0.0).resolve().unwrap(), 0.0);
        assert_eq!(Threshold::Numeric(1.0).resolve().unwrap(), 1.0);
        assert!(Threshold::Numeric(1.01).resolve().is_err());
        assert!(Threshold::Numeric(-0.1).resolve().is_err());
        assert!(Threshold::Numeric(f64::NAN).resolve().is_err());
    }

    #[test]
    fn defaults() {
        assert_eq!(Threshold::default().resolve().unwrap(), 0.7);
        assert_eq!(Tier::default(), Tier::Medium);
    }

    #[test]
    fn raw_review_rejects_blank_text() {
        assert!(RawReview::new("").is_err());
        assert!(RawReview::new("   \n").is_err());
        assert!(RawReview::new("fine").is_ok());
    }

    #[test]
    fn display_text_prefix_only_with_title() {
        let untitled = RawReview::new("Works well").unwrap();
        assert_eq!(untitled.display_text(), "Works well");

        let empty_title = RawReview::new("Works well").unwrap().with_title("");
        assert_eq!(empty_title.display_text(), " : Works well");

        let titled = RawReview::new("Works well").unwrap().with_title("Solid");
        assert_eq!(titled.display_text(), "Solid : Works well");
    }

    #[test]
    fn rating_is_string_or_int() {
        let r: Rating = serde_json::from_str("\"4/5\"").unwrap();
        assert_eq!(r, Rating::Text("4/5".into()));
        let r: Rating = serde_json::from_str("5").unwrap();
        assert_eq!(r, Rating::Number(5));
        assert_eq!(r.to_string(), "5");
    }

    #[test]
    fn result_omits_missing_rating() {
        let result = ClassificationResult {
            review_text: "ok".into(),
            confidence: 12,
            label: true,
            rating: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("rating").is_none());
        assert_eq!(json["confidence"], 12);
    }
}
