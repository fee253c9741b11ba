//! Request dispatch.
//!
//! `DispatchClient` is the single seam between the shell and the provider
//! backends: it validates preconditions, picks the adapter wired for the
//! provider, and normalizes every success and failure into one result type.
//! `DispatchService` runs each call in a spawned task and reports outcomes
//! over a channel so the event loop never blocks on the network.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::{
    anthropic::{self, AnthropicAdapter},
    gemini::{self, GeminiAdapter},
    openai::{self, OpenAiAdapter},
    perplexity::{self, PerplexityAdapter},
    ProviderAdapter,
};
use crate::core::providers::{AdapterKind, ProviderRegistry};

/// Fixed deadline applied to every outbound request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything that can go wrong between "send" and "text came back".
///
/// Errors are data: they travel through the same channel as successes and
/// render as readable text, never as a panic or a process exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Requested provider id is not in the registry.
    UnknownProvider(String),
    /// The provider requires an API key and none is configured.
    MissingCredential(String),
    /// The HTTP client could not be set up at startup.
    TransportUnavailable(String),
    /// Connection-level failure reaching the remote endpoint.
    NetworkFailure(String),
    /// The remote answered with a non-success status.
    RemoteError { status: u16, body: String },
    /// The remote answered successfully but not in the expected shape.
    MalformedResponse(String),
    /// No response within [`REQUEST_TIMEOUT`].
    Timeout,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownProvider(id) => write!(f, "unknown provider '{id}'"),
            DispatchError::MissingCredential(name) => {
                write!(f, "no API key configured for {name}")
            }
            DispatchError::TransportUnavailable(reason) => {
                write!(f, "HTTP transport unavailable: {reason}")
            }
            DispatchError::NetworkFailure(reason) => write!(f, "network error: {reason}"),
            DispatchError::RemoteError { status, body } => {
                write!(f, "API request failed with status {status}: {body}")
            }
            DispatchError::MalformedResponse(detail) => {
                write!(f, "unexpected response shape: {detail}")
            }
            DispatchError::Timeout => {
                write!(f, "no response within {} seconds", REQUEST_TIMEOUT.as_secs())
            }
        }
    }
}

impl StdError for DispatchError {}

impl DispatchError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::Timeout
        } else {
            DispatchError::NetworkFailure(err.to_string())
        }
    }
}

pub struct DispatchClient {
    registry: ProviderRegistry,
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    probe_failure: Option<String>,
}

impl DispatchClient {
    /// Build the shared HTTP client once and wire an adapter per catalog
    /// entry. A client construction failure is recorded here instead of
    /// being rediscovered on every send.
    pub fn new(registry: ProviderRegistry) -> Self {
        let mut adapters: HashMap<String, Arc<dyn ProviderAdapter>> = HashMap::new();
        let probe_failure = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(client) => {
                for provider in registry.list() {
                    let base_url = provider.base_url.as_deref();
                    let adapter: Arc<dyn ProviderAdapter> = match provider.kind {
                        AdapterKind::OpenAi => Arc::new(OpenAiAdapter::new(
                            client.clone(),
                            base_url.unwrap_or(openai::DEFAULT_BASE_URL),
                        )),
                        AdapterKind::Anthropic => Arc::new(AnthropicAdapter::new(
                            client.clone(),
                            base_url.unwrap_or(anthropic::DEFAULT_BASE_URL),
                        )),
                        AdapterKind::Gemini => Arc::new(GeminiAdapter::new(
                            client.clone(),
                            base_url.unwrap_or(gemini::DEFAULT_BASE_URL),
                        )),
                        AdapterKind::OpenAiCompat => Arc::new(PerplexityAdapter::new(
                            client.clone(),
                            base_url.unwrap_or(perplexity::DEFAULT_BASE_URL),
                        )),
                    };
                    adapters.insert(provider.id.clone(), adapter);
                }
                None
            }
            Err(err) => Some(err.to_string()),
        };

        Self {
            registry,
            adapters,
            probe_failure,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Result of the startup capability probe, surfaced to the shell.
    pub fn transport_ready(&self) -> bool {
        self.probe_failure.is_none()
    }

    /// Send one user message to one provider/model.
    ///
    /// Preconditions run in order before any network activity: the provider
    /// must be known, and a provider that requires a key must have one. An
    /// out-of-catalog model proceeds with a warning; the remote service is
    /// the authority on model names.
    pub async fn send(
        &self,
        provider_id: &str,
        model: &str,
        message: &str,
        api_key: Option<&str>,
    ) -> Result<String, DispatchError> {
        let provider = self
            .registry
            .get(provider_id)
            .ok_or_else(|| DispatchError::UnknownProvider(provider_id.to_string()))?;

        let api_key = api_key.unwrap_or("");
        if provider.requires_api_key && api_key.trim().is_empty() {
            return Err(DispatchError::MissingCredential(
                provider.display_name.clone(),
            ));
        }

        if let Some(reason) = &self.probe_failure {
            return Err(DispatchError::TransportUnavailable(reason.clone()));
        }

        if !provider.models.iter().any(|m| m == model) {
            tracing::warn!(
                provider = %provider.id,
                model,
                "model not in the built-in catalog, sending anyway"
            );
        }

        let adapter = self.adapters.get(&provider.id).ok_or_else(|| {
            DispatchError::TransportUnavailable(format!(
                "no adapter wired for provider '{}'",
                provider.id
            ))
        })?;

        adapter.send_message(api_key, model, message).await
    }
}

pub type DispatchOutcome = Result<String, DispatchError>;

#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub provider_id: String,
    pub model: String,
    pub message: String,
    pub api_key: Option<String>,
    pub request_id: u64,
}

/// Hands dispatches to spawned tasks and delivers `(outcome, request_id)`
/// pairs back over an unbounded channel. The shell keeps at most one
/// request outstanding; the id lets it drop anything stale.
#[derive(Clone)]
pub struct DispatchService {
    tx: mpsc::UnboundedSender<(DispatchOutcome, u64)>,
}

impl DispatchService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(DispatchOutcome, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_dispatch(&self, client: Arc<DispatchClient>, request: DispatchRequest) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let DispatchRequest {
                provider_id,
                model,
                message,
                api_key,
                request_id,
            } = request;

            let outcome = client
                .send(&provider_id, &model, &message, api_key.as_deref())
                .await;
            let _ = tx.send((outcome, request_id));
        });
    }
}
