pub mod error;
pub mod openai;
pub mod schema;

pub use error::{LlmError, Result};
pub use openai::OpenAi;
pub use schema::StructuredOutput;
