//! Anthropic messages adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{check_status, read_json, ProviderAdapter, MAX_RESPONSE_TOKENS};
use crate::core::dispatch::DispatchError;
use crate::utils::url::join_url;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic requires a dated API version header on every request.
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    async fn send_message(
        &self,
        api_key: &str,
        model: &str,
        message: &str,
    ) -> Result<String, DispatchError> {
        let request = MessagesRequest {
            model,
            max_tokens: MAX_RESPONSE_TOKENS,
            messages: vec![RequestMessage {
                role: "user",
                content: message,
            }],
        };

        let response = self
            .client
            .post(join_url(&self.base_url, "v1/messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(DispatchError::from_transport)?;

        let response = check_status(response).await?;
        let parsed: MessagesResponse = read_json(response).await?;

        parsed
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| {
                DispatchError::MalformedResponse("message response had no text block".into())
            })
    }
}
