use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::types::{ChatResponse, StructuredRequest};
use crate::error::{LlmError, Result};

pub(crate) struct OpenAiClient<'a> {
    http: &'a reqwest::Client,
    api_key: &'a str,
    base_url: &'a str,
}

impl<'a> OpenAiClient<'a> {
    pub fn new(http: &'a reqwest::Client, api_key: &'a str, base_url: &'a str) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| LlmError::Config(format!("invalid API key header: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// POST a structured-output chat completion and return the raw message
    /// content of the first choice.
    pub async fn structured_output(&self, request: &StructuredRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "OpenAI structured output request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::EmptyCompletion(request.model.clone()))
    }
}
