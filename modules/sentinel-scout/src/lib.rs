pub mod extractor;
pub mod fetchers;
pub mod gateway;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod url_guard;

pub use extractor::{ExtractedReview, LlmReviewExtractor};
pub use fetchers::{BrowserlessFetcher, HttpFetcher};
pub use gateway::{page_url, ReviewGateway};
pub use traits::{PageFetcher, ReviewExtractor, ReviewSource};
