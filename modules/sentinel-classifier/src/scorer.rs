use sentinel_common::Result;

/// Batch probability provider behind the classification service.
///
/// Implementations return exactly one value per input, in input order, each
/// the probability that the text belongs to the genuine class. They are
/// shared read-only across concurrent requests.
pub trait Scorer: Send + Sync {
    fn score(&self, texts: &[String]) -> Result<Vec<f64>>;

    fn name(&self) -> &str;
}
