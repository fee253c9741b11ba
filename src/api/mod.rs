//! Provider adapters.
//!
//! Each adapter translates the uniform "send one user message, get text
//! back" contract into one backend's request/response shapes. Adding a
//! provider means adding one adapter here and one catalog entry in
//! `builtin_providers.toml`; the dispatch logic never changes.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod perplexity;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::core::dispatch::DispatchError;

/// Output cap applied to every request, matching across all backends.
pub const MAX_RESPONSE_TOKENS: u32 = 1000;

/// The uniform contract every backend adapter implements.
///
/// Implementations convert every failure into a [`DispatchError`]; nothing
/// panics or leaks a transport-specific error type past this seam.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn send_message(
        &self,
        api_key: &str,
        model: &str,
        message: &str,
    ) -> Result<String, DispatchError>;
}

/// Fail on a non-success status, carrying the status code and the response
/// body verbatim.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, DispatchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DispatchError::RemoteError {
        status: status.as_u16(),
        body,
    })
}

/// Deserialize a response body, distinguishing decode failures (the remote
/// answered, but not in the expected shape) from transport failures.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DispatchError> {
    response.json::<T>().await.map_err(|err| {
        if err.is_decode() {
            DispatchError::MalformedResponse(err.to_string())
        } else {
            DispatchError::from_transport(err)
        }
    })
}
