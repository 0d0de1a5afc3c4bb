//! Application layer for convo.
//!
//! Services that drive the chat backend on behalf of a front-end: the session
//! list and message flow, and the enhanced chat pipeline.

pub mod enhanced;
pub mod session;

pub use enhanced::{EnhancedChatService, ProgressIndicator, ProgressState};
pub use session::{ChatSessionService, ChatSnapshot, ModeDispatcher};
