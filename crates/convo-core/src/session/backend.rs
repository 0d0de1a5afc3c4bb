//! Chat backend trait.
//!
//! Defines the interface to the remote chat service.

use super::message::HistoryRecord;
use super::mode::ChatMode;
use super::model::Session;
use crate::enhanced::EnhancedRequest;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text substituted when the backend answers without `response` or `text`.
pub const EMPTY_REPLY_TEXT: &str = "No response received.";

/// A backend reply to a send.
///
/// `payload` is the full JSON body, kept opaque; `text` is the reply text
/// extracted from it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: Option<String>,
    pub payload: Value,
}

impl ChatReply {
    /// Builds a reply from a raw JSON body.
    ///
    /// The text is taken from `response`, then `text`. When `response` is an
    /// object the same two keys are looked up inside it.
    pub fn from_payload(payload: Value) -> Self {
        let text = extract_reply_text(&payload);
        Self { text, payload }
    }

    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            payload: serde_json::json!({ "response": text }),
            text: Some(text),
        }
    }

    /// The reply text, or [`EMPTY_REPLY_TEXT`] when the backend sent none.
    pub fn text_or_default(&self) -> &str {
        self.text.as_deref().unwrap_or(EMPTY_REPLY_TEXT)
    }
}

fn extract_reply_text(payload: &Value) -> Option<String> {
    let direct = |v: &Value| -> Option<String> {
        ["response", "text"]
            .iter()
            .filter_map(|key| v.get(key).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(str::to_string)
    };
    direct(payload).or_else(|| payload.get("response").and_then(|nested| direct(nested)))
}

/// The remote chat service, as the session service sees it.
///
/// This trait decouples session state management from the transport
/// (HTTP in production, in-memory mocks in tests).
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Lists the user's sessions.
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Fetches up to `limit` stored exchanges of a session.
    async fn fetch_history(&self, session_id: &str, limit: u32) -> Result<Vec<HistoryRecord>>;

    /// Creates a session with the given title.
    async fn create_session(&self, title: &str) -> Result<Session>;

    /// Sends a message through the session-scoped endpoint.
    async fn send_message(
        &self,
        session_id: &str,
        message: &str,
        session_type: ChatMode,
    ) -> Result<ChatReply>;

    /// Renames a session.
    async fn rename_session(&self, session_id: &str, title: &str) -> Result<()>;

    /// Deletes a session.
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Runs an enhanced (file search + classification) chat request.
    async fn send_enhanced(&self, request: &EnhancedRequest) -> Result<ChatReply>;
}
