#![allow(dead_code)]

use async_trait::async_trait;
use convo_application::{ChatSessionService, EnhancedChatService};
use convo_core::config::{ChatConfig, EnhancedConfig};
use convo_core::enhanced::EnhancedRequest;
use convo_core::error::Result;
use convo_core::session::{ChatBackend, ChatMode, ChatReply, HistoryRecord, Session};
use convo_core::ChatError;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Pauses a backend call until the test releases it.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Waits until a call has reached the gate.
    pub async fn reached(&self) {
        self.entered.notified().await;
    }

    pub fn open(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
pub struct CallCounts {
    pub list_sessions: AtomicUsize,
    pub fetch_history: AtomicUsize,
    pub create_session: AtomicUsize,
    pub send_message: AtomicUsize,
    pub send_enhanced: AtomicUsize,
    pub rename_session: AtomicUsize,
    pub delete_session: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// In-memory backend with scripted failures and optional gates.
#[derive(Default)]
pub struct MockBackend {
    pub calls: CallCounts,
    sessions: Mutex<Vec<Session>>,
    histories: Mutex<HashMap<String, Vec<HistoryRecord>>>,
    next_id: AtomicUsize,
    reply: Mutex<Option<serde_json::Value>>,
    send_failures: Mutex<VecDeque<ChatError>>,
    enhanced_failures: Mutex<VecDeque<ChatError>>,
    fail_create: Mutex<Option<ChatError>>,
    fail_list: Mutex<Option<ChatError>>,
    fail_history: Mutex<Option<ChatError>>,
    fail_mutations: Mutex<Option<ChatError>>,
    send_gate: Mutex<Option<Arc<Gate>>>,
    history_gates: Mutex<HashMap<String, Arc<Gate>>>,
    last_send_session: Mutex<Option<String>>,
    last_enhanced: Mutex<Option<EnhancedRequest>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_session(self: &Arc<Self>, id: &str, history: Vec<HistoryRecord>) -> Arc<Self> {
        self.sessions
            .lock()
            .unwrap()
            .push(Session::new(id, format!("Session {}", id)));
        self.histories
            .lock()
            .unwrap()
            .insert(id.to_string(), history);
        self.clone()
    }

    pub fn set_reply(&self, payload: serde_json::Value) {
        *self.reply.lock().unwrap() = Some(payload);
    }

    pub fn fail_next_send(&self, err: ChatError) {
        self.send_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_enhanced(&self, err: ChatError) {
        self.enhanced_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_create(&self, err: ChatError) {
        *self.fail_create.lock().unwrap() = Some(err);
    }

    pub fn fail_list(&self, err: ChatError) {
        *self.fail_list.lock().unwrap() = Some(err);
    }

    pub fn fail_history(&self, err: ChatError) {
        *self.fail_history.lock().unwrap() = Some(err);
    }

    pub fn fail_mutations(&self, err: ChatError) {
        *self.fail_mutations.lock().unwrap() = Some(err);
    }

    pub fn gate_sends(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.send_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_history(&self, session_id: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.history_gates
            .lock()
            .unwrap()
            .insert(session_id.to_string(), gate.clone());
        gate
    }

    pub fn last_send_session(&self) -> Option<String> {
        self.last_send_session.lock().unwrap().clone()
    }

    pub fn last_enhanced(&self) -> Option<EnhancedRequest> {
        self.last_enhanced.lock().unwrap().clone()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    fn mutation_failure(&self) -> Option<ChatError> {
        self.fail_mutations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.calls.list_sessions.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_list.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn fetch_history(&self, session_id: &str, _limit: u32) -> Result<Vec<HistoryRecord>> {
        self.calls.fetch_history.fetch_add(1, Ordering::SeqCst);
        let gate = self.history_gates.lock().unwrap().remove(session_id);
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if let Some(err) = self.fail_history.lock().unwrap().clone() {
            return Err(err);
        }
        self.histories
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ChatError::http(404, "Session not found"))
    }

    async fn create_session(&self, title: &str) -> Result<Session> {
        self.calls.create_session.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_create.lock().unwrap().clone() {
            return Err(err);
        }
        let id = format!("created-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let session = Session::new(id.clone(), title);
        self.sessions.lock().unwrap().push(session.clone());
        self.histories.lock().unwrap().insert(id, Vec::new());
        Ok(session)
    }

    async fn send_message(
        &self,
        session_id: &str,
        message: &str,
        _session_type: ChatMode,
    ) -> Result<ChatReply> {
        self.calls.send_message.fetch_add(1, Ordering::SeqCst);
        *self.last_send_session.lock().unwrap() = Some(session_id.to_string());
        let gate = self.send_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if let Some(err) = self.send_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let payload = self
            .reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| json!({ "response": format!("echo: {}", message) }));
        Ok(ChatReply::from_payload(payload))
    }

    async fn rename_session(&self, session_id: &str, title: &str) -> Result<()> {
        self.calls.rename_session.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.mutation_failure() {
            return Err(err);
        }
        if let Some(session) = self
            .sessions
            .lock()
            .unwrap()
            .iter_mut()
            .find(|s| s.id == session_id)
        {
            session.title = title.to_string();
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.calls.delete_session.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.mutation_failure() {
            return Err(err);
        }
        self.sessions.lock().unwrap().retain(|s| s.id != session_id);
        Ok(())
    }

    async fn send_enhanced(&self, request: &EnhancedRequest) -> Result<ChatReply> {
        self.calls.send_enhanced.fetch_add(1, Ordering::SeqCst);
        *self.last_enhanced.lock().unwrap() = Some(request.clone());
        if let Some(err) = self.enhanced_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(ChatReply::from_payload(json!({
            "response": format!("enhanced: {}", request.message),
            "search_results": [],
        })))
    }
}

pub fn history(pairs: &[(&str, &str)]) -> Vec<HistoryRecord> {
    pairs
        .iter()
        .map(|(message, response)| HistoryRecord {
            message: Some(message.to_string()),
            response: Some(response.to_string()),
            created_at: Some("2024-05-01T10:00:00Z".to_string()),
            ..Default::default()
        })
        .collect()
}

pub fn enhanced_service(backend: Arc<MockBackend>) -> Arc<EnhancedChatService> {
    Arc::new(EnhancedChatService::new(
        backend,
        EnhancedConfig::default().without_delays(),
    ))
}

pub fn chat_service(backend: Arc<MockBackend>) -> Arc<ChatSessionService> {
    let enhanced = enhanced_service(backend.clone());
    Arc::new(ChatSessionService::new(
        backend,
        enhanced,
        ChatConfig::default(),
    ))
}
