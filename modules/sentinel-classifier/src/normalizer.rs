//! Review text → token string fed to the model.
//!
//! Segmentation follows Unicode word boundaries (UAX #29), so punctuation
//! ends up in its own segments and can be dropped without splitting words
//! like `don't` or `3.5`.

use unicode_segmentation::UnicodeSegmentation;

use sentinel_common::RawReview;

use crate::stopwords::is_stopword;

/// Normalize a review: title and text are joined (title first) when a
/// non-empty title is present, otherwise the text is used alone.
pub fn normalize(review: &RawReview) -> String {
    match review.title() {
        Some(title) if !title.trim().is_empty() => {
            normalize_text(&format!("{title} {}", review.text()))
        }
        _ => normalize_text(review.text()),
    }
}

/// Lowercase, drop punctuation/symbol-only tokens and stopwords, and rejoin
/// the survivors with single spaces. May return an empty string.
pub fn normalize_text(text: &str) -> String {
    text.split_word_bounds()
        .filter(|segment| segment.chars().any(char::is_alphanumeric))
        .map(str::to_lowercase)
        .filter(|token| !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}
