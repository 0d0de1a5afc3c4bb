//! Conversation message types.
//!
//! Messages shown to the user are [`ChatMessage`]s. The backend stores one
//! [`HistoryRecord`] per exchange, which expands into up to two messages.

use super::mode::ChatMode;
use crate::enhanced::EnhancedResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Client-side correlation id, assigned when the message is created.
///
/// Placeholders are finalized and removed by this id, so reconciliation does
/// not depend on the message's position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single message in the selected session's message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    /// ISO 8601 timestamp; history rows without `created_at` have none.
    pub timestamp: Option<String>,
    /// Mode the message was sent in. `None` for messages loaded from history.
    pub mode: Option<ChatMode>,
    /// True only for the bot placeholder of an in-flight send.
    pub is_loading: bool,
    #[serde(default)]
    pub enhanced: Option<EnhancedResult>,
}

impl ChatMessage {
    /// Creates a user message stamped with the current time.
    pub fn user(text: impl Into<String>, mode: ChatMode) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::User,
            text: text.into(),
            timestamp: Some(now_rfc3339()),
            mode: Some(mode),
            is_loading: false,
            enhanced: None,
        }
    }

    /// Creates the loading bot placeholder for an in-flight send.
    pub fn placeholder(mode: ChatMode) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::Bot,
            text: String::new(),
            timestamp: Some(now_rfc3339()),
            mode: Some(mode),
            is_loading: true,
            enhanced: None,
        }
    }

    /// Creates a finalized bot message.
    pub fn bot(
        text: impl Into<String>,
        mode: ChatMode,
        enhanced: Option<EnhancedResult>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::Bot,
            text: text.into(),
            timestamp: Some(now_rfc3339()),
            mode: Some(mode),
            is_loading: false,
            enhanced,
        }
    }

    /// Creates a message restored from backend history.
    pub fn from_history(sender: Sender, text: impl Into<String>, timestamp: Option<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            text: text.into(),
            timestamp,
            mode: None,
            is_loading: false,
            enhanced: None,
        }
    }
}

/// One stored exchange as returned by the history endpoint.
///
/// A record holds the user's `message` and the bot's `response` together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub message_type: Option<String>,
}

impl HistoryRecord {
    /// Expands the record into its ordered client messages: the user message
    /// when `message` is non-empty, then the bot message when `response` is
    /// not blank.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(text) = self.message.filter(|m| !m.is_empty()) {
            messages.push(ChatMessage::from_history(
                Sender::User,
                text,
                self.created_at.clone(),
            ));
        }
        if let Some(text) = self.response.filter(|r| !r.trim().is_empty()) {
            messages.push(ChatMessage::from_history(Sender::Bot, text, self.created_at));
        }
        messages
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
