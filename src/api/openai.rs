//! OpenAI chat-completions adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{check_status, read_json, ProviderAdapter, MAX_RESPONSE_TOKENS};
use crate::core::dispatch::DispatchError;
use crate::utils::url::join_url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    async fn send_message(
        &self,
        api_key: &str,
        model: &str,
        message: &str,
    ) -> Result<String, DispatchError> {
        let request = CompletionRequest {
            model,
            messages: vec![RequestMessage {
                role: "user",
                content: message,
            }],
            max_tokens: MAX_RESPONSE_TOKENS,
        };

        let response = self
            .client
            .post(join_url(&self.base_url, "chat/completions"))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(DispatchError::from_transport)?;

        let response = check_status(response).await?;
        let parsed: CompletionResponse = read_json(response).await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                DispatchError::MalformedResponse("chat completion had no message content".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_the_first_completion_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"hello"}}]}"#)
            .create_async()
            .await;

        let adapter = OpenAiAdapter::new(reqwest::Client::new(), server.url());
        let reply = adapter
            .send_message("sk-test", "gpt-4o", "hi there")
            .await
            .expect("dispatch should succeed");

        assert_eq!(reply, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn request_carries_model_user_turn_and_token_cap() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "ping"}],
                "max_tokens": 1000,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"pong"}}]}"#)
            .create_async()
            .await;

        let adapter = OpenAiAdapter::new(reqwest::Client::new(), server.url());
        let reply = adapter
            .send_message("sk-test", "gpt-4o-mini", "ping")
            .await
            .expect("dispatch should succeed");

        assert_eq!(reply, "pong");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_choice_list_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let adapter = OpenAiAdapter::new(reqwest::Client::new(), server.url());
        let err = adapter
            .send_message("sk-test", "gpt-4o", "hi")
            .await
            .expect_err("no choices should fail");

        assert!(matches!(err, DispatchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn non_success_status_carries_code_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let adapter = OpenAiAdapter::new(reqwest::Client::new(), server.url());
        let err = adapter
            .send_message("sk-test", "gpt-4o", "hi")
            .await
            .expect_err("500 should fail");

        assert_eq!(
            err,
            DispatchError::RemoteError {
                status: 500,
                body: "upstream exploded".into(),
            }
        );
    }
}
