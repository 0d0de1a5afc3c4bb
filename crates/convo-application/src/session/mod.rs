//! Chat session module.
//!
//! - `store`: session list and selection state
//! - `reconciler`: optimistic message insertion and placeholder reconciliation
//! - `dispatcher`: per-mode routing of a send
//! - `service`: the `ChatSessionService` tying them to a backend

mod dispatcher;
mod reconciler;
mod service;
mod store;

pub use dispatcher::{BotReply, ModeDispatcher};
pub use reconciler::{MessageReconciler, PendingExchange, Resolution};
pub use service::{ChatSessionService, ChatSnapshot};
pub use store::{LoadTicket, SelectionTicket, SessionStore};
