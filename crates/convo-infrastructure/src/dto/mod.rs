//! Wire DTOs for the chat backend.

pub mod auth;
pub mod session;

pub use auth::{ErrorBody, LoginRequest};
pub use session::{
    CreateSessionRequest, CreateSessionResponse, HistoryResponse, RenameSessionRequest,
    SendMessageRequest, SessionListResponse,
};
