//! Session DTOs (anti-corruption layer over the backend's JSON).
//!
//! The backend is not consistent about envelopes: list endpoints answer
//! either a bare array or an object wrapping it, and ids may be numbers.

use convo_core::session::{ChatMode, HistoryRecord, Session};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreateSessionRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub message: &'a str,
    pub session_type: ChatMode,
}

#[derive(Debug, Serialize)]
pub struct RenameSessionRequest<'a> {
    pub title: &'a str,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SessionDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type", alias = "session_type")]
    pub session_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub message_count: Option<u64>,
}

impl From<SessionDto> for Session {
    fn from(dto: SessionDto) -> Self {
        let session_type = dto
            .session_type
            .as_deref()
            .and_then(|t| t.parse::<ChatMode>().ok())
            .unwrap_or_default();
        Session {
            id: dto.id,
            title: dto.title.unwrap_or_default(),
            session_type,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
            message_count: dto.message_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SessionListResponse {
    Bare(Vec<SessionDto>),
    Wrapped { sessions: Vec<SessionDto> },
}

impl SessionListResponse {
    pub fn into_sessions(self) -> Vec<Session> {
        let dtos = match self {
            Self::Wrapped { sessions } => sessions,
            Self::Bare(sessions) => sessions,
        };
        dtos.into_iter().map(Session::from).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreateSessionResponse {
    Wrapped { session: SessionDto },
    Bare(SessionDto),
}

impl CreateSessionResponse {
    pub fn into_session(self) -> Session {
        match self {
            Self::Wrapped { session } => session.into(),
            Self::Bare(session) => session.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRecordDto {
    #[serde(default, deserialize_with = "optional_string_or_number")]
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

impl From<HistoryRecordDto> for HistoryRecord {
    fn from(dto: HistoryRecordDto) -> Self {
        HistoryRecord {
            id: dto.id,
            message: dto.message,
            response: dto.response,
            created_at: dto.created_at,
            message_type: dto.message_type,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HistoryResponse {
    Bare(Vec<HistoryRecordDto>),
    Wrapped { messages: Vec<HistoryRecordDto> },
}

impl HistoryResponse {
    pub fn into_records(self) -> Vec<HistoryRecord> {
        let dtos = match self {
            Self::Wrapped { messages } => messages,
            Self::Bare(messages) => messages,
        };
        dtos.into_iter().map(HistoryRecord::from).collect()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
