//! Error types for the convo client.

use crate::session::ChatMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A shared error type for the whole convo client.
///
/// Backend, transport and local failures all funnel into this enum. Front-ends
/// never see it directly for most operations: the session service converts it
/// into a [`SurfacedError`] and stores that instead.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ChatError {
    /// The backend rejected the bearer token (HTTP 401).
    #[error("Unauthorized: the session token is missing or expired")]
    Unauthorized,

    /// Non-success HTTP status with the backend's error message
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection, timeout or other transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// IO error (token file, config file)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A send was attempted with no selected session and no pending compose.
    #[error("No chat session selected")]
    NoSessionSelected,

    /// The chat mode has no send path.
    #[error("Chat mode '{0}' is not supported for sending messages")]
    UnsupportedMode(ChatMode),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Http error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a JSON serialization error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an Unauthorized error
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Check if the backend answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// Check if this is a transport-level error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::json(err.to_string())
    }
}

impl From<toml::de::Error> for ChatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ChatError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::json(err.to_string());
        }
        match err.status() {
            Some(status) if status.as_u16() == 401 => Self::Unauthorized,
            Some(status) => Self::http(status.as_u16(), err.to_string()),
            None => Self::Network(err.to_string()),
        }
    }
}

/// A type alias for `Result<T, ChatError>`.
pub type Result<T> = std::result::Result<T, ChatError>;

/// The operation an error surfaced from.
///
/// Serialized in snake_case (`load_sessions`, `send_message`, ...) so that
/// front-ends can key messages on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    LoadSessions,
    LoadMessages,
    CreateSession,
    SendMessage,
    UpdateSession,
    DeleteSession,
    EnhancedProcessing,
}

impl ErrorKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadSessions => "load_sessions",
            Self::LoadMessages => "load_messages",
            Self::CreateSession => "create_session",
            Self::SendMessage => "send_message",
            Self::UpdateSession => "update_session",
            Self::DeleteSession => "delete_session",
            Self::EnhancedProcessing => "enhanced_processing",
        }
    }

    /// The user-facing message shown for this kind when no better text exists.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::LoadSessions => "Failed to load chat sessions.",
            Self::LoadMessages => "Failed to load messages.",
            Self::CreateSession => "Failed to create a new conversation.",
            Self::SendMessage => "Failed to send message.",
            Self::UpdateSession => "Failed to update the conversation.",
            Self::DeleteSession => "Failed to delete the conversation.",
            Self::EnhancedProcessing => "Enhanced chat processing failed.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{type, message}` pair stored in a service's error slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfacedError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
}

impl SurfacedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Builds the error with the kind's default user-facing message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    /// Builds the error with the kind's default message followed by the cause.
    pub fn with_cause(kind: ErrorKind, cause: &ChatError) -> Self {
        Self::new(kind, format!("{} ({})", kind.default_message(), cause))
    }
}

impl fmt::Display for SurfacedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
