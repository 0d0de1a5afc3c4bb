//! Session domain module.
//!
//! This module contains the session and message models and the backend
//! interface the session service talks to.
//!
//! # Module Structure
//!
//! - `mode`: Chat mode / session type (`ChatMode`)
//! - `model`: Core session model (`Session`)
//! - `message`: Message types (`ChatMessage`, `Sender`, `MessageId`, `HistoryRecord`)
//! - `backend`: Backend trait (`ChatBackend`) and reply type (`ChatReply`)

mod backend;
mod message;
mod mode;
mod model;

// Re-export public API
pub use backend::{ChatBackend, ChatReply, EMPTY_REPLY_TEXT};
pub use message::{ChatMessage, HistoryRecord, MessageId, Sender};
pub use mode::ChatMode;
pub use model::Session;
