//! Chat session service.
//!
//! Owns the session list, the selected session's messages and the error slot
//! that front-ends render. Backend failures are converted into a
//! [`SurfacedError`] and stored rather than returned, with `create_session`
//! as the one exception.

use super::dispatcher::ModeDispatcher;
use super::reconciler::MessageReconciler;
use super::store::SessionStore;
use crate::enhanced::EnhancedChatService;
use convo_core::config::ChatConfig;
use convo_core::error::Result;
use convo_core::session::{ChatBackend, ChatMessage, ChatMode, Session};
use convo_core::{ChatError, ErrorKind, SurfacedError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// A point-in-time copy of everything a front-end renders.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatSnapshot {
    pub sessions: Vec<Session>,
    pub selected_session_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub is_loading_sessions: bool,
    pub is_loading_chat: bool,
    pub loading_session_id: Option<String>,
    pub is_composing_new: bool,
    pub error: Option<SurfacedError>,
}

#[derive(Debug, Default)]
struct ChatState {
    store: SessionStore,
    reconciler: MessageReconciler,
    is_loading_chat: bool,
    loading_session_id: Option<String>,
    /// Last error wins.
    error: Option<SurfacedError>,
}

impl ChatState {
    fn surface(&mut self, kind: ErrorKind, cause: &ChatError) {
        let error = SurfacedError::with_cause(kind, cause);
        warn!("[ChatSession] {}", error);
        self.error = Some(error);
    }

    /// Drops the send's loading flag unless a selection has taken it over.
    fn finish_send(&mut self, session_id: &str) {
        if self.loading_session_id.as_deref() == Some(session_id) {
            self.is_loading_chat = false;
            self.loading_session_id = None;
        }
    }
}

/// Session list, selection and message flow for one user.
///
/// The state lock is never held across a backend call, so a snapshot taken
/// while a request is in flight shows the optimistic messages.
pub struct ChatSessionService {
    backend: Arc<dyn ChatBackend>,
    dispatcher: ModeDispatcher,
    enhanced: Arc<EnhancedChatService>,
    config: ChatConfig,
    state: RwLock<ChatState>,
    /// Held for the whole of a send; only one send runs at a time.
    send_gate: Mutex<()>,
}

impl ChatSessionService {
    /// Creates a service over `backend`.
    ///
    /// # Arguments
    ///
    /// * `backend` - The remote chat service
    /// * `enhanced` - The enhanced pipeline used for `enhanced` mode sends
    /// * `config` - History limit and default session title
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        enhanced: Arc<EnhancedChatService>,
        config: ChatConfig,
    ) -> Self {
        Self {
            dispatcher: ModeDispatcher::new(backend.clone(), enhanced.clone()),
            backend,
            enhanced,
            config,
            state: RwLock::new(ChatState::default()),
            send_gate: Mutex::new(()),
        }
    }

    pub fn enhanced(&self) -> &Arc<EnhancedChatService> {
        &self.enhanced
    }

    // ============================================================================
    // Session list
    // ============================================================================

    /// Fetches the session list.
    ///
    /// Without `force` this is a no-op once the list has loaded or while a
    /// fetch is in flight.
    pub async fn load_sessions(&self, force: bool) {
        let ticket = {
            let mut state = self.state.write().await;
            match state.store.begin_load(force) {
                Some(ticket) => {
                    state.error = None;
                    ticket
                }
                None => {
                    debug!("[ChatSession] Session list already loaded, skipping");
                    return;
                }
            }
        };

        let outcome = self.backend.list_sessions().await;

        let mut state = self.state.write().await;
        match outcome {
            Ok(sessions) => {
                let count = sessions.len();
                if state.store.finish_load(ticket, sessions) {
                    info!("[ChatSession] Loaded {} sessions", count);
                } else {
                    debug!("[ChatSession] Discarding superseded session list");
                }
            }
            Err(err) => {
                if state.store.abort_load(ticket) {
                    state.surface(ErrorKind::LoadSessions, &err);
                }
            }
        }
    }

    /// Selects a session and loads its history.
    ///
    /// History is committed only if no other selection happened while the
    /// fetch was in flight.
    pub async fn select_session(&self, session_id: &str) {
        let ticket = {
            let mut state = self.state.write().await;
            let ticket = state.store.select(session_id);
            state.reconciler.clear();
            state.is_loading_chat = true;
            state.loading_session_id = Some(session_id.to_string());
            state.error = None;
            ticket
        };
        debug!("[ChatSession] Selected session {}", session_id);

        let outcome = self
            .backend
            .fetch_history(session_id, self.config.history_limit)
            .await;

        let mut state = self.state.write().await;
        if !state.store.is_current(&ticket) {
            debug!(
                "[ChatSession] Discarding stale history for session {}",
                session_id
            );
            return;
        }
        state.is_loading_chat = false;
        state.loading_session_id = None;
        match outcome {
            Ok(records) => {
                state.reconciler.load_history(records);
                debug!(
                    "[ChatSession] Loaded {} messages for session {}",
                    state.reconciler.messages().len(),
                    session_id
                );
            }
            Err(err) => {
                state.reconciler.clear();
                state.surface(ErrorKind::LoadMessages, &err);
            }
        }
    }

    /// Enters compose mode: no selection, no messages. The session is created
    /// by the first send.
    pub async fn start_new_session(&self) {
        let mut state = self.state.write().await;
        state.store.start_composing();
        state.reconciler.clear();
        state.is_loading_chat = false;
        state.loading_session_id = None;
        state.error = None;
    }

    /// Creates a session on the backend, selects it and reloads the list.
    ///
    /// # Errors
    ///
    /// Returns the backend error after surfacing it as `create_session`.
    pub async fn create_session(&self, title: Option<&str>) -> Result<Session> {
        self.create_session_inner(title, false).await
    }

    /// With `keep_messages` the optimistic messages of the send that
    /// triggered the create stay in the list.
    async fn create_session_inner(
        &self,
        title: Option<&str>,
        keep_messages: bool,
    ) -> Result<Session> {
        self.state.write().await.error = None;
        let title = title.unwrap_or(&self.config.default_title);
        match self.backend.create_session(title).await {
            Ok(session) => {
                {
                    let mut state = self.state.write().await;
                    state.store.adopt_created(&session);
                    if !keep_messages {
                        state.reconciler.clear();
                    }
                    state.is_loading_chat = false;
                    state.loading_session_id = None;
                }
                info!("[ChatSession] Created session {}", session.id);
                self.load_sessions(true).await;
                Ok(session)
            }
            Err(err) => {
                self.state
                    .write()
                    .await
                    .surface(ErrorKind::CreateSession, &err);
                Err(err)
            }
        }
    }

    /// Renames a session. Returns whether the backend accepted it.
    pub async fn rename_session(&self, session_id: &str, title: &str) -> bool {
        let outcome = self.backend.rename_session(session_id, title).await;
        let mut state = self.state.write().await;
        match outcome {
            Ok(()) => {
                state.store.rename(session_id, title);
                true
            }
            Err(err) => {
                state.surface(ErrorKind::UpdateSession, &err);
                false
            }
        }
    }

    /// Deletes a session. Returns whether the backend accepted it.
    pub async fn delete_session(&self, session_id: &str) -> bool {
        let outcome = self.backend.delete_session(session_id).await;
        let mut state = self.state.write().await;
        match outcome {
            Ok(()) => {
                if state.store.remove(session_id) {
                    state.reconciler.clear();
                    state.is_loading_chat = false;
                    state.loading_session_id = None;
                }
                info!("[ChatSession] Deleted session {}", session_id);
                true
            }
            Err(err) => {
                state.surface(ErrorKind::DeleteSession, &err);
                false
            }
        }
    }

    // ============================================================================
    // Messages
    // ============================================================================

    /// Sends `text` in `mode` to the selected session.
    ///
    /// The user message appears immediately, even if the send later fails.
    /// In compose mode the session is created first. A loading placeholder
    /// then stands in for the reply until it is replaced by the reply, or
    /// removed on failure. `is_loading_chat` is set while the reply is in
    /// flight.
    ///
    /// # Returns
    ///
    /// The finalized bot message, or `None` if the send failed (see [`Self::snapshot`]
    /// for the surfaced error).
    pub async fn send_message(&self, text: &str, mode: ChatMode) -> Option<ChatMessage> {
        let _gate = self.send_gate.lock().await;

        let (selected, composing, user_message_id) = {
            let mut state = self.state.write().await;
            state.error = None;
            let user_message_id = state.reconciler.push_user(text, mode);
            (
                state.store.selected_session_id().map(str::to_string),
                state.store.is_composing_new(),
                user_message_id,
            )
        };
        let session_id = match selected {
            Some(id) => id,
            None if composing => match self.create_session_inner(None, true).await {
                Ok(session) => session.id,
                Err(err) => {
                    self.state
                        .write()
                        .await
                        .surface(ErrorKind::SendMessage, &err);
                    return None;
                }
            },
            None => {
                self.state
                    .write()
                    .await
                    .surface(ErrorKind::SendMessage, &ChatError::NoSessionSelected);
                return None;
            }
        };

        let pending = {
            let mut state = self.state.write().await;
            state.is_loading_chat = true;
            state.loading_session_id = Some(session_id.clone());
            state.reconciler.await_reply(user_message_id, mode)
        };
        debug!("[ChatSession] Sending to {} ({})", session_id, mode);

        let outcome = self.dispatcher.dispatch(&session_id, text, mode).await;

        let mut state = self.state.write().await;
        state.finish_send(&session_id);
        match outcome {
            Ok(reply) => {
                let message = ChatMessage::bot(reply.text, mode, reply.enhanced);
                let still_selected = state.store.is_selected(&session_id);
                state
                    .reconciler
                    .resolve(&pending, message.clone(), still_selected)
                    .into_message()
                    .or(Some(message))
            }
            Err(err) => {
                state.reconciler.fail(&pending);
                state.surface(ErrorKind::SendMessage, &err);
                None
            }
        }
    }

    // ============================================================================
    // State access
    // ============================================================================

    pub async fn error(&self) -> Option<SurfacedError> {
        self.state.read().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    pub async fn snapshot(&self) -> ChatSnapshot {
        let state = self.state.read().await;
        ChatSnapshot {
            sessions: state.store.sessions().to_vec(),
            selected_session_id: state.store.selected_session_id().map(str::to_string),
            messages: state.reconciler.messages().to_vec(),
            is_loading_sessions: state.store.is_loading(),
            is_loading_chat: state.is_loading_chat,
            loading_session_id: state.loading_session_id.clone(),
            is_composing_new: state.store.is_composing_new(),
            error: state.error.clone(),
        }
    }
}
