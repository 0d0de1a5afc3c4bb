pub mod auth;
pub mod render;
pub mod repl;
pub mod sessions;

use anyhow::Result;
use colored::Colorize;
use convo_application::{ChatSessionService, EnhancedChatService};
use convo_core::auth::TokenStore;
use convo_core::config::ApiConfig;
use convo_infrastructure::token_store::ENV_TOKEN;
use convo_infrastructure::{ConfigService, FileTokenStore, HttpChatBackend, MemoryTokenStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Services shared by every command.
pub struct AppContext {
    pub backend: Arc<HttpChatBackend>,
    pub chat: Arc<ChatSessionService>,
}

impl AppContext {
    pub fn build(config_path: Option<PathBuf>) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new()?,
        };
        let config = config_service.get_config()?;
        tracing::debug!(
            "Using config {} (api: {})",
            config_service.path().display(),
            config.api.base_url
        );

        let backend = Arc::new(HttpChatBackend::from_config(
            &config.api,
            token_store(&config.api)?,
        )?);
        let enhanced = Arc::new(EnhancedChatService::new(
            backend.clone(),
            config.enhanced.clone(),
        ));
        let chat = Arc::new(ChatSessionService::new(
            backend.clone(),
            enhanced,
            config.chat.clone(),
        ));
        Ok(Self { backend, chat })
    }

    pub fn enhanced(&self) -> &Arc<EnhancedChatService> {
        self.chat.enhanced()
    }

    /// Turns a surfaced error into a command failure, clearing the slot.
    pub async fn check_error(&self) -> Result<()> {
        let Some(error) = self.chat.error().await else {
            return Ok(());
        };
        self.chat.clear_error().await;
        if !self.backend.is_authenticated() {
            eprintln!(
                "{}",
                "Not logged in or session expired. Run `convo login` to sign in.".yellow()
            );
        }
        anyhow::bail!("{}", error.message)
    }
}

/// `CONVO_TOKEN` wins over the token file and is never written back.
fn token_store(api: &ApiConfig) -> Result<Arc<dyn TokenStore>> {
    if let Some(token) = std::env::var(ENV_TOKEN).ok().filter(|t| !t.trim().is_empty()) {
        return Ok(Arc::new(MemoryTokenStore::with_token(token.trim())));
    }
    let store = match &api.token_file {
        Some(path) => FileTokenStore::with_path(path.clone()),
        None => FileTokenStore::new()?,
    };
    Ok(Arc::new(store))
}
