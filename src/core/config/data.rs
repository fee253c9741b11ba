use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The single unit of persisted state: one JSON object per user.
///
/// Only `api_keys` is interpreted today; any other top-level keys found in
/// the file are kept in `extra` so they survive a load/save round trip.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Config {
    /// Case-insensitive key lookup. An empty stored value reads as absent,
    /// matching the invariant that "" never stands in for "not configured".
    pub fn get_api_key(&self, provider_id: &str) -> Option<&str> {
        self.api_keys
            .get(&provider_id.to_lowercase())
            .map(String::as_str)
            .filter(|key| !key.trim().is_empty())
    }

    /// Insert or overwrite a key under the lowercased provider id. An empty
    /// secret removes the entry instead of storing an empty string.
    pub fn set_api_key(&mut self, provider_id: &str, secret: &str) {
        let id = provider_id.to_lowercase();
        let secret = secret.trim();
        if secret.is_empty() {
            self.api_keys.remove(&id);
        } else {
            self.api_keys.insert(id, secret.to_string());
        }
    }
}
