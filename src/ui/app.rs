//! Interactive application state.
//!
//! `App` holds everything the render pass needs: the current
//! provider/model selection, the transcript, the in-flight request (at most
//! one), and the status-line text. All mutation happens on the event loop;
//! network work lives in tasks spawned through [`DispatchService`].

use std::error::Error;
use std::sync::Arc;

use crate::core::credentials::CredentialStore;
use crate::core::dispatch::{
    DispatchClient, DispatchError, DispatchOutcome, DispatchRequest, DispatchService,
};
use crate::core::providers::Provider;

/// What the input area currently feeds: chat text or an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Message,
    ApiKey,
}

/// One completed exchange, newest kept at the front of the transcript.
pub struct ChatTurn {
    pub user_text: String,
    pub provider_name: String,
    pub outcome: DispatchOutcome,
}

pub struct PendingDispatch {
    pub request_id: u64,
    pub user_text: String,
    pub provider_name: String,
}

pub struct App {
    client: Arc<DispatchClient>,
    store: CredentialStore,
    service: DispatchService,
    pub turns: Vec<ChatTurn>,
    pub pending: Option<PendingDispatch>,
    pub input_mode: InputMode,
    pub status: String,
    pub scroll_offset: u16,
    provider_index: usize,
    selected_model: String,
    next_request_id: u64,
}

impl App {
    pub fn new(
        client: Arc<DispatchClient>,
        store: CredentialStore,
        service: DispatchService,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<Self, Box<dyn Error>> {
        let providers = client.registry().list();
        if providers.is_empty() {
            return Err("provider catalog is empty".into());
        }

        let provider_index = match provider {
            Some(id) => providers
                .iter()
                .position(|p| p.id.eq_ignore_ascii_case(id))
                .ok_or_else(|| format!("unknown provider '{id}' (try `chatmux providers`)"))?,
            None => 0,
        };

        // An out-of-catalog model from the command line is accepted as-is;
        // the remote service is the authority on model names.
        let selected_model = match model {
            Some(m) => m.to_string(),
            None => providers[provider_index]
                .models
                .first()
                .cloned()
                .unwrap_or_default(),
        };

        let status = if client.transport_ready() {
            "Ready".to_string()
        } else {
            "HTTP transport unavailable; requests will fail".to_string()
        };

        Ok(Self {
            client,
            store,
            service,
            turns: Vec::new(),
            pending: None,
            input_mode: InputMode::Message,
            status,
            scroll_offset: 0,
            provider_index,
            selected_model,
            next_request_id: 1,
        })
    }

    pub fn selected_provider(&self) -> &Provider {
        &self.client.registry().list()[self.provider_index]
    }

    pub fn selected_model(&self) -> &str {
        &self.selected_model
    }

    pub fn key_configured(&self) -> bool {
        self.store.is_configured(&self.selected_provider().id)
    }

    pub fn next_provider(&mut self) {
        let count = self.client.registry().list().len();
        self.provider_index = (self.provider_index + 1) % count;

        let provider = self.selected_provider();
        let name = provider.display_name.clone();
        let first_model = provider.models.first().cloned().unwrap_or_default();
        self.selected_model = first_model;
        self.status = format!("Provider: {name}");
    }

    pub fn next_model(&mut self) {
        let models = self.selected_provider().models.clone();
        if models.is_empty() {
            return;
        }
        let next = match models.iter().position(|m| *m == self.selected_model) {
            Some(current) => (current + 1) % models.len(),
            None => 0,
        };
        self.selected_model = models[next].clone();
        self.status = format!("Model: {}", self.selected_model);
    }

    /// Fire a dispatch for `text`. Returns false when nothing was sent (so
    /// the caller keeps the typed input around).
    pub fn begin_send(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            self.status = "Type a message first".to_string();
            return false;
        }
        if self.pending.is_some() {
            self.status = "Still waiting on the previous reply".to_string();
            return false;
        }

        let provider = self.selected_provider();
        let provider_id = provider.id.clone();
        let provider_name = provider.display_name.clone();
        let api_key = self.store.get(&provider_id).map(str::to_owned);

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        self.service.spawn_dispatch(
            self.client.clone(),
            DispatchRequest {
                provider_id,
                model: self.selected_model.clone(),
                message: text.to_string(),
                api_key,
                request_id,
            },
        );

        self.pending = Some(PendingDispatch {
            request_id,
            user_text: text.to_string(),
            provider_name: provider_name.clone(),
        });
        self.status = format!("Sending to {provider_name}…");
        true
    }

    /// Deliver a dispatch outcome. Outcomes for anything but the current
    /// pending request are dropped.
    pub fn on_outcome(&mut self, request_id: u64, outcome: DispatchOutcome) {
        let Some(pending) = self.pending.take_if(|p| p.request_id == request_id) else {
            return;
        };

        self.status = match &outcome {
            Ok(_) => "Response received".to_string(),
            Err(err) => format!("Error: {}", status_label(err)),
        };
        self.turns.insert(
            0,
            ChatTurn {
                user_text: pending.user_text,
                provider_name: pending.provider_name,
                outcome,
            },
        );
        self.scroll_offset = 0;
    }

    /// Save an API key for the selected provider. Returns false when the
    /// input was empty and nothing was stored.
    pub fn save_api_key(&mut self, secret: &str) -> bool {
        let secret = secret.trim();
        if secret.is_empty() {
            self.status = "Please enter an API key".to_string();
            return false;
        }

        let provider = self.selected_provider();
        let provider_id = provider.id.clone();
        let provider_name = provider.display_name.clone();

        self.status = match self.store.set(&provider_id, secret) {
            Ok(()) => format!("API key saved for {provider_name}"),
            Err(err) => format!("Key kept in memory only: {err}"),
        };
        self.input_mode = InputMode::Message;
        true
    }

    pub fn toggle_key_entry(&mut self) {
        match self.input_mode {
            InputMode::Message => {
                let name = self.selected_provider().display_name.clone();
                self.status = format!("Enter the API key for {name}");
                self.input_mode = InputMode::ApiKey;
            }
            InputMode::ApiKey => self.cancel_key_entry(),
        }
    }

    pub fn cancel_key_entry(&mut self) {
        self.input_mode = InputMode::Message;
        self.status = "Ready".to_string();
    }

    pub fn clear_transcript(&mut self) {
        self.turns.clear();
        self.scroll_offset = 0;
        self.status = "Conversation cleared".to_string();
    }
}

fn status_label(err: &DispatchError) -> &'static str {
    match err {
        DispatchError::UnknownProvider(_) => "unknown provider",
        DispatchError::MissingCredential(_) => "API key missing",
        DispatchError::TransportUnavailable(_) => "transport unavailable",
        DispatchError::NetworkFailure(_) => "network failure",
        DispatchError::RemoteError { .. } => "provider returned an error",
        DispatchError::MalformedResponse(_) => "unexpected response",
        DispatchError::Timeout => "request timed out",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::providers::ProviderRegistry;
    use tempfile::TempDir;

    fn test_app() -> (App, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let store = CredentialStore::load_from_path(dir.path().join("config.json"));
        let client = Arc::new(DispatchClient::new(ProviderRegistry::builtin()));
        let (service, _rx) = DispatchService::new();
        let app = App::new(client, store, service, None, None).expect("app");
        (app, dir)
    }

    #[test]
    fn starts_on_the_first_provider_and_its_first_model() {
        let (app, _dir) = test_app();
        assert_eq!(app.selected_provider().id, "openai");
        assert_eq!(app.selected_model(), "gpt-4o");
        assert_eq!(app.status, "Ready");
    }

    #[test]
    fn unknown_initial_provider_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let store = CredentialStore::load_from_path(dir.path().join("config.json"));
        let client = Arc::new(DispatchClient::new(ProviderRegistry::builtin()));
        let (service, _rx) = DispatchService::new();

        assert!(App::new(client, store, service, Some("nope"), None).is_err());
    }

    #[test]
    fn cycling_provider_resets_the_model() {
        let (mut app, _dir) = test_app();
        app.next_provider();
        assert_eq!(app.selected_provider().id, "claude");
        assert_eq!(app.selected_model(), "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn cycling_model_wraps_around() {
        let (mut app, _dir) = test_app();
        app.next_model();
        assert_eq!(app.selected_model(), "gpt-4o-mini");
        app.next_model();
        app.next_model();
        assert_eq!(app.selected_model(), "gpt-4o");
    }

    #[tokio::test]
    async fn send_refuses_empty_and_reentrant_messages() {
        let (mut app, _dir) = test_app();

        assert!(!app.begin_send("   "));
        assert_eq!(app.status, "Type a message first");

        assert!(app.begin_send("hello"));
        assert!(app.pending.is_some());

        assert!(!app.begin_send("hello again"));
        assert_eq!(app.status, "Still waiting on the previous reply");
    }

    #[tokio::test]
    async fn outcome_prepends_a_turn_and_clears_pending() {
        let (mut app, _dir) = test_app();

        assert!(app.begin_send("first"));
        let id = app.pending.as_ref().unwrap().request_id;
        app.on_outcome(id, Ok("reply one".to_string()));

        assert!(app.pending.is_none());
        assert_eq!(app.turns.len(), 1);

        assert!(app.begin_send("second"));
        let id = app.pending.as_ref().unwrap().request_id;
        app.on_outcome(id, Ok("reply two".to_string()));

        // Newest turn sits at the front.
        assert_eq!(app.turns[0].user_text, "second");
        assert_eq!(app.turns[1].user_text, "first");
    }

    #[tokio::test]
    async fn stale_outcomes_are_dropped() {
        let (mut app, _dir) = test_app();

        assert!(app.begin_send("hello"));
        app.on_outcome(9999, Ok("not for us".to_string()));

        assert!(app.pending.is_some());
        assert!(app.turns.is_empty());
    }

    #[test]
    fn empty_api_key_is_not_saved() {
        let (mut app, _dir) = test_app();
        app.toggle_key_entry();

        assert!(!app.save_api_key("  "));
        assert_eq!(app.status, "Please enter an API key");
        assert!(!app.key_configured());
    }

    #[test]
    fn saved_api_key_flips_the_status_indicator() {
        let (mut app, _dir) = test_app();
        app.toggle_key_entry();

        assert!(app.save_api_key("sk-shiny"));
        assert_eq!(app.input_mode, InputMode::Message);
        assert!(app.key_configured());
    }
}
