//! Configuration service implementation.
//!
//! Loads the client configuration from `~/.config/convo/config.toml` and
//! applies environment overrides.

use crate::paths::ConvoPaths;
use convo_core::config::ClientConfig;
use convo_core::error::{ChatError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Overrides `api.base_url`.
pub const ENV_API_URL: &str = "CONVO_API_URL";

/// Configuration service that loads and caches the client configuration.
///
/// A missing file yields the defaults; a malformed file is an error.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the default config path.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(ConvoPaths::config_file()?))
    }

    /// Creates a service reading `path` (used by tests and `--config`).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|_| ChatError::internal("config cache lock poisoned"))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = Self::load_from(&self.path)?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        let mut write_lock = self
            .config
            .write()
            .map_err(|_| ChatError::internal("config cache lock poisoned"))?;
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    /// Writes `config` to the config file and refreshes the cache.
    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, text)?;
        tracing::info!("[Config] Saved configuration to {}", self.path.display());
        self.invalidate_cache();
        Ok(())
    }

    fn load_from(path: &Path) -> Result<ClientConfig> {
        if !path.exists() {
            tracing::debug!("[Config] {} not found, using defaults", path.display());
            return Ok(ClientConfig::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            ChatError::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

fn apply_env_overrides(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
        tracing::debug!("[Config] {} overrides api.base_url", ENV_API_URL);
        config.api.base_url = url;
    }
}
