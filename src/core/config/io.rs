use crate::core::config::data::Config;
use directories::BaseDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Errors that can occur when loading the configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// A failed write-to-disk. Non-fatal: the in-memory configuration stays
/// valid and the caller reports the failure as a status message.
#[derive(Debug)]
pub struct PersistError {
    path: PathBuf,
    source: Box<dyn StdError + Send + Sync>,
}

impl PersistError {
    fn new(path: &Path, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to save config at {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl StdError for PersistError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

impl Config {
    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    /// Full rewrite of the configuration file. The contents land in a
    /// temporary file in the target directory first and replace the real
    /// file atomically, so a failed write never truncates existing state.
    pub fn save_to_path(&self, config_path: &Path) -> Result<(), PersistError> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|e| PersistError::new(config_path, e))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| PersistError::new(config_path, e))?;

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|e| PersistError::new(config_path, e))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| PersistError::new(config_path, e))?;
        temp_file
            .as_file_mut()
            .sync_all()
            .map_err(|e| PersistError::new(config_path, e))?;
        temp_file
            .persist(config_path)
            .map_err(|e| PersistError::new(config_path, e.error))?;
        Ok(())
    }
}

/// The fixed per-user configuration path: `~/.chatmux/config.json`.
pub fn default_config_path() -> PathBuf {
    let base_dirs = BaseDirs::new().expect("failed to determine home directory");
    base_dirs.home_dir().join(".chatmux").join("config.json")
}
