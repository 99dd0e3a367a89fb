pub mod model;
pub mod normalizer;
pub mod scorer;
pub mod service;
mod stopwords;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use model::LinearTextModel;
pub use normalizer::{normalize, normalize_text};
pub use scorer::Scorer;
pub use service::{confidence_percent, ReviewClassifier};
