//! Built-in provider catalog
//!
//! The set of providers is fixed at process start: it is parsed once from the
//! embedded `builtin_providers.toml` and never mutated afterwards. The shell
//! reads it to populate the provider/model pickers and the dispatch client
//! reads it to validate requests.

use serde::{Deserialize, Serialize};

/// Wire protocol family a provider speaks. Selects the adapter the dispatch
/// client wires up for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    OpenAi,
    Anthropic,
    Gemini,
    #[serde(rename = "openai-compat")]
    OpenAiCompat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub display_name: String,
    pub kind: AdapterKind,
    /// Ordered list of selectable models; the first entry is the default.
    pub models: Vec<String>,
    #[serde(default = "default_requires_api_key")]
    pub requires_api_key: bool,
    /// Fixed endpoint base address, when the adapter default does not apply.
    pub base_url: Option<String>,
}

fn default_requires_api_key() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ProviderCatalog {
    providers: Vec<Provider>,
}

/// Read-only, ordered catalog of the providers known to this build.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    /// Load the catalog embedded in the binary.
    pub fn builtin() -> Self {
        const CATALOG: &str = include_str!("../builtin_providers.toml");

        let catalog: ProviderCatalog =
            toml::from_str(CATALOG).expect("failed to parse builtin_providers.toml");

        Self {
            providers: catalog.providers,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_providers(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    pub fn list(&self) -> &[Provider] {
        &self.providers
    }

    /// Case-insensitive lookup by provider id.
    pub fn get(&self, id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    /// Models offered by a provider, empty for unknown ids.
    pub fn models_for(&self, id: &str) -> &[String] {
        self.get(id).map(|p| p.models.as_slice()).unwrap_or(&[])
    }
}
