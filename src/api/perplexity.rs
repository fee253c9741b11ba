//! Perplexity adapter.
//!
//! OpenAI-compatible wire shape over raw JSON: the request is built with
//! `serde_json::json!` and the reply is read through an explicit JSON
//! pointer instead of typed payload structs. Any non-200 status becomes a
//! [`DispatchError::RemoteError`] carrying the body verbatim.

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{read_json, ProviderAdapter, MAX_RESPONSE_TOKENS};
use crate::core::dispatch::DispatchError;
use crate::utils::url::join_url;

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

pub struct PerplexityAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl PerplexityAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for PerplexityAdapter {
    async fn send_message(
        &self,
        api_key: &str,
        model: &str,
        message: &str,
    ) -> Result<String, DispatchError> {
        let request = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": message}],
            "max_tokens": MAX_RESPONSE_TOKENS,
        });

        let response = self
            .client
            .post(join_url(&self.base_url, "chat/completions"))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(DispatchError::from_transport)?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::RemoteError { status, body });
        }

        let value: Value = read_json(response).await?;
        value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                DispatchError::MalformedResponse(
                    "completion had no choices[0].message.content".into(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_content_via_json_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer pplx-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"sonar says hi"}}]}"#)
            .create_async()
            .await;

        let adapter = PerplexityAdapter::new(reqwest::Client::new(), server.url());
        let reply = adapter
            .send_message("pplx-test", "llama-3.1-sonar-small-128k-online", "hi")
            .await
            .expect("dispatch should succeed");

        assert_eq!(reply, "sonar says hi");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limit_surfaces_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":"rate limited"}"#)
            .create_async()
            .await;

        let adapter = PerplexityAdapter::new(reqwest::Client::new(), server.url());
        let err = adapter
            .send_message("pplx-test", "llama-3.1-sonar-large-128k-online", "hi")
            .await
            .expect_err("429 should fail");

        assert_eq!(
            err,
            DispatchError::RemoteError {
                status: 429,
                body: r#"{"error":"rate limited"}"#.into(),
            }
        );
    }

    #[tokio::test]
    async fn missing_json_path_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{}}]}"#)
            .create_async()
            .await;

        let adapter = PerplexityAdapter::new(reqwest::Client::new(), server.url());
        let err = adapter
            .send_message("pplx-test", "llama-3.1-sonar-small-128k-online", "hi")
            .await
            .expect_err("missing content should fail");

        assert!(matches!(err, DispatchError::MalformedResponse(_)));
    }
}
