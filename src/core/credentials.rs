//! Per-provider API key storage.
//!
//! `CredentialStore` is the sole owner of the [`Config`] object: everything
//! else reads secrets through it and writes go back to disk immediately.
//! A missing or corrupt configuration file falls back to an empty store so
//! that configuration damage never prevents startup.

use std::path::{Path, PathBuf};

use crate::core::config::{default_config_path, Config, PersistError};

pub struct CredentialStore {
    config: Config,
    path: PathBuf,
}

impl CredentialStore {
    /// Load from the fixed per-user path (`~/.chatmux/config.json`).
    pub fn load_default() -> Self {
        Self::load_from_path(default_config_path())
    }

    pub fn load_from_path(path: PathBuf) -> Self {
        let config = match Config::load_from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("starting with empty configuration: {err}");
                Config::default()
            }
        };
        Self { config, path }
    }

    /// Case-insensitive secret lookup. Pure read.
    pub fn get(&self, provider_id: &str) -> Option<&str> {
        self.config.get_api_key(provider_id)
    }

    pub fn is_configured(&self, provider_id: &str) -> bool {
        self.get(provider_id).is_some()
    }

    /// Store a secret and persist the whole configuration synchronously.
    ///
    /// On a persist failure the in-memory state keeps the new secret and the
    /// error is returned for the caller to surface; the application keeps
    /// running either way.
    pub fn set(&mut self, provider_id: &str, secret: &str) -> Result<(), PersistError> {
        self.config.set_api_key(provider_id, secret);
        self.config.save_to_path(&self.path).inspect_err(|err| {
            tracing::warn!("keeping API key in memory only: {err}");
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
