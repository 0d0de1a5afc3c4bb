//! Enhanced chat module.
//!
//! - `progress`: decorative stage indicator over a watch channel
//! - `service`: mode selection, settings and the enhanced request flow

mod progress;
mod service;

pub use progress::{ProgressIndicator, ProgressState};
pub use service::{EnhancedChatService, HISTORY_CAPACITY};
