//! Session domain model.

use super::mode::ChatMode;
use serde::{Deserialize, Serialize};

/// A named, server-side conversation thread.
///
/// This is the "pure" domain model the session service operates on,
/// independent of the backend's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend-assigned session identifier
    pub id: String,
    /// Human-readable session title
    pub title: String,
    /// Conversation type label
    pub session_type: ChatMode,
    /// Creation timestamp as reported by the backend (ISO 8601)
    pub created_at: Option<String>,
    /// Last update timestamp, when the backend reports one
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Number of stored exchanges, when the backend reports it
    #[serde(default)]
    pub message_count: Option<u64>,
}

impl Session {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            session_type: ChatMode::Normal,
            created_at: None,
            updated_at: None,
            message_count: None,
        }
    }

    pub fn with_type(mut self, session_type: ChatMode) -> Self {
        self.session_type = session_type;
        self
    }
}
