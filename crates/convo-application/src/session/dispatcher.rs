use crate::enhanced::EnhancedChatService;
use convo_core::ChatError;
use convo_core::enhanced::EnhancedResult;
use convo_core::error::Result;
use convo_core::session::{ChatBackend, ChatMode};
use std::sync::Arc;
use tracing::debug;

/// The bot side of a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct BotReply {
    pub text: String,
    pub enhanced: Option<EnhancedResult>,
}

/// Routes a send to the request path matching its chat mode.
pub struct ModeDispatcher {
    backend: Arc<dyn ChatBackend>,
    enhanced: Arc<EnhancedChatService>,
}

impl ModeDispatcher {
    pub fn new(backend: Arc<dyn ChatBackend>, enhanced: Arc<EnhancedChatService>) -> Self {
        Self { backend, enhanced }
    }

    pub async fn dispatch(&self, session_id: &str, text: &str, mode: ChatMode) -> Result<BotReply> {
        debug!("[Dispatch] {} message for session {}", mode, session_id);
        match mode {
            ChatMode::Normal => {
                let reply = self.backend.send_message(session_id, text, mode).await?;
                Ok(BotReply {
                    text: reply.text_or_default().to_string(),
                    enhanced: None,
                })
            }
            ChatMode::Enhanced => {
                let result = self.enhanced.process(text, Some(session_id)).await?;
                Ok(BotReply {
                    text: result.text.clone(),
                    enhanced: Some(result),
                })
            }
            ChatMode::Agentic => Err(ChatError::UnsupportedMode(mode)),
        }
    }
}
