//! Google Gemini adapter.
//!
//! Speaks the `generateContent` REST endpoint; the API key travels as the
//! `key` query parameter rather than a header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{check_status, read_json, ProviderAdapter};
use crate::core::dispatch::DispatchError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    async fn send_message(
        &self,
        api_key: &str,
        model: &str,
        message: &str,
    ) -> Result<String, DispatchError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: message }],
            }],
        };

        let response = self
            .client
            .post(self.generate_url(model))
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(DispatchError::from_transport)?;

        let response = check_status(response).await?;
        let parsed: GenerateResponse = read_json(response).await?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| {
                DispatchError::MalformedResponse("generation had no candidate text".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_the_first_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "g-key".into()))
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "contents": [{"parts": [{"text": "hi"}]}],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"hello from gemini"}]}}]}"#,
            )
            .create_async()
            .await;

        let adapter = GeminiAdapter::new(reqwest::Client::new(), server.url());
        let reply = adapter
            .send_message("g-key", "gemini-1.5-flash", "hi")
            .await
            .expect("dispatch should succeed");

        assert_eq!(reply, "hello from gemini");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_candidates_are_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-1.5-pro:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let adapter = GeminiAdapter::new(reqwest::Client::new(), server.url());
        let err = adapter
            .send_message("g-key", "gemini-1.5-pro", "hi")
            .await
            .expect_err("no candidates should fail");

        assert!(matches!(err, DispatchError::MalformedResponse(_)));
    }
}
