mod client;
pub(crate) mod types;

use std::time::Duration;

use crate::error::{LlmError, Result};
use crate::schema::StructuredOutput;

use client::OpenAiClient;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

// =============================================================================
// OpenAi
// =============================================================================

/// OpenAI-compatible chat completion client. Cheap to clone; the underlying
/// `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request (connect + response) by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> OpenAiClient<'_> {
        OpenAiClient::new(&self.http, &self.api_key, &self.base_url)
    }

    fn structured_request(
        &self,
        system: &str,
        user: &str,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> types::StructuredRequest {
        types::StructuredRequest {
            model: self.model.clone(),
            messages: vec![
                types::WireMessage::system(system),
                types::WireMessage::user(user),
            ],
            temperature: types::supports_temperature(&self.model).then_some(0.0),
            response_format: types::ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: types::JsonSchemaFormat {
                    name: schema_name.to_string(),
                    strict: true,
                    schema,
                },
            },
        }
    }

    /// Request a completion constrained to `schema` and return the raw JSON
    /// text (code fences stripped). Callers that need to tell a transport
    /// failure from an undecodable reply parse it themselves.
    pub async fn structured_output(
        &self,
        system: &str,
        user: &str,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> Result<String> {
        let request = self.structured_request(system, user, schema_name, schema);
        let raw = self.client().structured_output(&request).await?;
        Ok(json_payload(&raw).to_string())
    }

    /// Type-safe structured output extraction.
    pub async fn extract<T: StructuredOutput>(&self, system: &str, user: &str) -> Result<T> {
        let json = self
            .structured_output(system, user, "structured_response", T::strict_schema())
            .await?;
        serde_json::from_str(&json)
            .map_err(|e| LlmError::Parse(format!("failed to deserialize response: {e}")))
    }
}

/// The JSON object inside a reply. Some compatible servers wrap it in a
/// markdown fence or a line of prose despite the strict response format.
fn json_payload(reply: &str) -> &str {
    let reply = reply.trim();
    match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => reply
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim(),
    }
}
