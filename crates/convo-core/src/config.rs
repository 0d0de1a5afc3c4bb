use crate::enhanced::{EnhancedSettings, StagePacing};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Root of `config.toml`. Every section and field is optional.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub chat: ChatConfig,
    pub enhanced: EnhancedConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Where the bearer token is kept. Defaults to `<config dir>/token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            token_file: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// How many stored exchanges to fetch when a session is selected.
    pub history_limit: u32,
    /// Title given to sessions created implicitly by a first send.
    pub default_title: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            default_title: DEFAULT_SESSION_TITLE.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnhancedConfig {
    /// Extra attempts after the first failed enhanced request.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub settings: EnhancedSettings,
    pub pacing: StagePacing,
}

impl Default for EnhancedConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff_ms: 2000,
            settings: EnhancedSettings::default(),
            pacing: StagePacing::default(),
        }
    }
}

impl EnhancedConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Zero delays everywhere: no cosmetic pacing, no retry backoff.
    pub fn without_delays(mut self) -> Self {
        self.retry_backoff_ms = 0;
        self.pacing = StagePacing::instant();
        self
    }
}
