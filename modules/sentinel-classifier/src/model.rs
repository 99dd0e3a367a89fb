use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use sentinel_common::{Result, SentinelError};

use crate::scorer::Scorer;

const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// On-disk model artifact, exported offline from the trained pipeline
/// (bag-of-words → TF-IDF → calibrated linear decision function).
#[derive(Debug, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    /// Class labels in decision-function order; the decision value favours
    /// `classes[1]`.
    classes: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default)]
    calibration: Calibration,
}

/// Platt scaling: `P(classes[1]) = 1 / (1 + exp(a * f + b))`.
#[derive(Debug, Clone, Copy, Deserialize)]
struct Calibration {
    a: f64,
    b: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self { a: -1.0, b: 0.0 }
    }
}

/// Linear TF-IDF text classifier loaded once at startup.
#[derive(Debug)]
pub struct LinearTextModel {
    name: String,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coefficients: Vec<f64>,
    intercept: f64,
    calibration: Calibration,
    genuine_is_positive: bool,
}

impl LinearTextModel {
    /// Load and validate an artifact. `genuine_class` names the label whose
    /// probability `score` reports; it must be one of the artifact's classes.
    pub fn load(path: impl AsRef<Path>, genuine_class: &str) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SentinelError::Scoring(format!("cannot read model artifact {}: {e}", path.display()))
        })?;
        let model = Self::from_json(&json, genuine_class)?
            .with_name(path.file_name().and_then(|n| n.to_str()).unwrap_or("model"));

        info!(
            path = %path.display(),
            vocabulary = model.vocabulary_size(),
            genuine_class,
            "Loaded review classifier model"
        );
        Ok(model)
    }

    pub fn from_json(json: &str, genuine_class: &str) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_str(json)
            .map_err(|e| SentinelError::Scoring(format!("malformed model artifact: {e}")))?;
        Self::from_artifact(artifact, genuine_class)
    }

    fn from_artifact(artifact: ModelArtifact, genuine_class: &str) -> Result<Self> {
        if artifact.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(SentinelError::Scoring(format!(
                "unsupported model format version {} (expected {SUPPORTED_FORMAT_VERSION})",
                artifact.format_version
            )));
        }
        if artifact.classes.len() != 2 {
            return Err(SentinelError::Scoring(format!(
                "expected a binary model, found {} classes",
                artifact.classes.len()
            )));
        }
        let genuine_index = artifact
            .classes
            .iter()
            .position(|c| c == genuine_class)
            .ok_or_else(|| {
                SentinelError::Scoring(format!(
                    "genuine class '{genuine_class}' not in model classes {:?}",
                    artifact.classes
                ))
            })?;

        let dims = artifact.coefficients.len();
        if artifact.idf.len() != dims {
            return Err(SentinelError::Scoring(format!(
                "idf has {} entries but coefficients have {dims}",
                artifact.idf.len()
            )));
        }
        if let Some((term, idx)) = artifact.vocabulary.iter().find(|(_, &idx)| idx >= dims) {
            return Err(SentinelError::Scoring(format!(
                "vocabulary term '{term}' maps to index {idx} outside {dims} features"
            )));
        }
        let all_finite = artifact
            .idf
            .iter()
            .chain(&artifact.coefficients)
            .chain([&artifact.intercept, &artifact.calibration.a, &artifact.calibration.b])
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(SentinelError::Scoring(
                "model artifact contains non-finite weights".to_string(),
            ));
        }

        Ok(Self {
            name: "linear-tfidf".to_string(),
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            coefficients: artifact.coefficients,
            intercept: artifact.intercept,
            calibration: artifact.calibration,
            genuine_is_positive: genuine_index == 1,
        })
    }

    fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Raw decision value for already-normalized text.
    ///
    /// Vocabulary keys carry no ASCII punctuation (`4.5` is stored as `45`,
    /// `john's` as `johns`), so each token is stripped the same way first.
    fn decision(&self, text: &str) -> f64 {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in text.split_whitespace() {
            let key: String = token.chars().filter(|c| !c.is_ascii_punctuation()).collect();
            if let Some(&idx) = self.vocabulary.get(&key) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }

        let weighted: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();
        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return self.intercept;
        }

        self.intercept
            + weighted
                .iter()
                .map(|&(idx, w)| self.coefficients[idx] * w / norm)
                .sum::<f64>()
    }

    fn genuine_probability(&self, text: &str) -> f64 {
        let f = self.decision(text);
        let positive = 1.0 / (1.0 + (self.calibration.a * f + self.calibration.b).exp());
        let genuine = if self.genuine_is_positive {
            positive
        } else {
            1.0 - positive
        };
        genuine.clamp(0.0, 1.0)
    }
}

impl Scorer for LinearTextModel {
    fn score(&self, texts: &[String]) -> Result<Vec<f64>> {
        Ok(texts.iter().map(|t| self.genuine_probability(t)).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// "great" pushes towards OR (genuine), "bot" towards CG.
    fn artifact_json(classes: &[&str]) -> String {
        serde_json::json!({
            "format_version": 1,
            "classes": classes,
            "vocabulary": {"great": 0, "bot": 1, "okay": 2},
            "idf": [1.0, 1.0, 1.0],
            "coefficients": [4.0, -4.0, 0.0],
            "intercept": 0.0
        })
        .to_string()
    }

    fn scores(model: &LinearTextModel, texts: &[&str]) -> Vec<f64> {
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        model.score(&owned).unwrap()
    }

    #[test]
    fn genuine_as_positive_class() {
        let model = LinearTextModel::from_json(&artifact_json(&["CG", "OR"]), "OR").unwrap();
        let p = scores(&model, &["great great", "bot", "okay"]);
        assert!(p[0] > 0.95);
        assert!(p[1] < 0.05);
        assert!((p[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn polarity_follows_class_name_not_index() {
        let model = LinearTextModel::from_json(&artifact_json(&["CG", "OR"]), "CG").unwrap();
        let p = scores(&model, &["great"]);
        assert!(p[0] < 0.05);
    }

    #[test]
    fn empty_text_scores_from_intercept() {
        let model = LinearTextModel::from_json(&artifact_json(&["CG", "OR"]), "OR").unwrap();
        let p = scores(&model, &["", "unknownword"]);
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn in_token_punctuation_ignored_for_lookup() {
        let json = serde_json::json!({
            "format_version": 1,
            "classes": ["CG", "OR"],
            "vocabulary": {"45": 0, "johns": 1},
            "idf": [1.0, 1.0],
            "coefficients": [3.0, 3.0],
            "intercept": 0.0
        })
        .to_string();
        let model = LinearTextModel::from_json(&json, "OR").unwrap();

        let p = scores(&model, &["4.5 john's", "45 johns", "neither"]);
        assert!(p[0] > 0.9);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[2], 0.5);
    }

    #[test]
    fn output_is_order_preserving_and_same_length() {
        let model = LinearTextModel::from_json(&artifact_json(&["CG", "OR"]), "OR").unwrap();
        let p = scores(&model, &["bot", "great", "okay", "bot"]);
        assert_eq!(p.len(), 4);
        assert!(p[0] < p[2] && p[2] < p[1]);
        assert_eq!(p[0], p[3]);
    }

    #[test]
    fn calibration_applied() {
        let json = serde_json::json!({
            "format_version": 1,
            "classes": ["CG", "OR"],
            "vocabulary": {},
            "idf": [],
            "coefficients": [],
            "intercept": 1.0,
            "calibration": {"a": -2.0, "b": 0.5}
        })
        .to_string();
        let model = LinearTextModel::from_json(&json, "OR").unwrap();
        let expected = 1.0 / (1.0 + (-2.0f64 * 1.0 + 0.5).exp());
        assert!((scores(&model, &[""])[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn unknown_genuine_class_rejected() {
        let err = LinearTextModel::from_json(&artifact_json(&["CG", "OR"]), "REAL").unwrap_err();
        assert!(matches!(err, SentinelError::Scoring(msg) if msg.contains("REAL")));
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let json = serde_json::json!({
            "format_version": 1,
            "classes": ["CG", "OR"],
            "vocabulary": {"a": 5},
            "idf": [1.0],
            "coefficients": [1.0],
            "intercept": 0.0
        })
        .to_string();
        assert!(LinearTextModel::from_json(&json, "OR").is_err());
    }

    #[test]
    fn wrong_version_rejected() {
        let json = artifact_json(&["CG", "OR"]).replace("\"format_version\":1", "\"format_version\":2");
        assert!(LinearTextModel::from_json(&json, "OR").is_err());
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            LinearTextModel::from_json("{not json", "OR"),
            Err(SentinelError::Scoring(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(artifact_json(&["CG", "OR"]).as_bytes()).unwrap();
        let model = LinearTextModel::load(file.path(), "OR").unwrap();
        assert_eq!(model.vocabulary_size(), 3);
    }

    #[test]
    fn missing_file_is_scoring_error() {
        let err = LinearTextModel::load("/nonexistent/model.json", "OR").unwrap_err();
        assert!(matches!(err, SentinelError::Scoring(_)));
    }
}
