//! Enhanced chat pipeline.
//!
//! One enhanced request plays a short decorative stage sequence, then calls
//! the backend with bounded inline retries. Outcomes feed a bounded history
//! from which usage stats are derived.

use super::progress::{ProgressIndicator, ProgressState};
use chrono::Utc;
use convo_core::config::EnhancedConfig;
use convo_core::enhanced::{
    EnhancedRecord, EnhancedRequest, EnhancedResult, EnhancedSettings, EnhancedSettingsUpdate,
    EnhancedStage, EnhancedStats,
};
use convo_core::error::Result;
use convo_core::session::{ChatBackend, ChatMode, ChatReply};
use convo_core::{ChatError, ErrorKind, SurfacedError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

/// Number of enhanced exchanges kept in history.
pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug)]
struct EnhancedState {
    chat_mode: ChatMode,
    settings: EnhancedSettings,
    last_result: Option<EnhancedResult>,
    /// Newest first.
    history: VecDeque<EnhancedRecord>,
    error: Option<SurfacedError>,
    retry_count: u32,
}

impl EnhancedState {
    fn new(settings: EnhancedSettings) -> Self {
        Self {
            chat_mode: ChatMode::default(),
            settings,
            last_result: None,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            error: None,
            retry_count: 0,
        }
    }

    fn record(&mut self, record: EnhancedRecord) {
        self.history.push_front(record);
        self.history.truncate(HISTORY_CAPACITY);
    }
}

/// Owns chat-mode selection, enhanced settings and the enhanced request flow.
pub struct EnhancedChatService {
    backend: Arc<dyn ChatBackend>,
    config: EnhancedConfig,
    state: RwLock<EnhancedState>,
    progress: ProgressIndicator,
}

impl EnhancedChatService {
    pub fn new(backend: Arc<dyn ChatBackend>, config: EnhancedConfig) -> Self {
        let state = EnhancedState::new(config.settings.clone());
        Self {
            backend,
            config,
            state: RwLock::new(state),
            progress: ProgressIndicator::new(),
        }
    }

    // ============================================================================
    // Mode and settings
    // ============================================================================

    pub async fn chat_mode(&self) -> ChatMode {
        self.state.read().await.chat_mode
    }

    /// Switches the active chat mode. Clears the enhanced error and progress.
    pub async fn toggle_chat_mode(&self, mode: ChatMode) {
        let mut state = self.state.write().await;
        debug!("[Enhanced] chat mode {} -> {}", state.chat_mode, mode);
        state.chat_mode = mode;
        state.error = None;
        self.progress.clear();
    }

    pub async fn settings(&self) -> EnhancedSettings {
        self.state.read().await.settings.clone()
    }

    /// Merges the provided fields into the current settings and returns the result.
    pub async fn update_settings(&self, update: EnhancedSettingsUpdate) -> EnhancedSettings {
        let mut state = self.state.write().await;
        state.settings.apply(&update);
        state.settings.clone()
    }

    // ============================================================================
    // Processing
    // ============================================================================

    /// Runs one enhanced exchange and returns its final outcome.
    ///
    /// Failed attempts are retried up to `max_retries` times after the
    /// configured backoff, except on `Unauthorized`. Every failed attempt
    /// updates the error slot; success clears it.
    pub async fn process(&self, message: &str, session_id: Option<&str>) -> Result<EnhancedResult> {
        let started = Instant::now();
        let settings = {
            let mut state = self.state.write().await;
            state.retry_count = 0;
            state.error = None;
            state.settings.clone()
        };

        self.progress.start();
        for (stage, dwell) in self.config.pacing.plan(&settings) {
            self.progress.advance(stage);
            if dwell > Duration::ZERO {
                tokio::time::sleep(dwell).await;
            }
        }

        let request = EnhancedRequest::new(message, &settings)
            .with_session(session_id.map(str::to_string));
        let (outcome, attempts) = self.send_with_retry(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let timestamp = Utc::now().to_rfc3339();

        let result = match outcome {
            Ok(reply) => {
                self.progress.advance(EnhancedStage::Completed);
                let result = EnhancedResult {
                    id: Utc::now().timestamp_millis(),
                    message: message.to_string(),
                    session_id: session_id.map(str::to_string),
                    timestamp: timestamp.clone(),
                    text: reply.text_or_default().to_string(),
                    payload: reply.payload,
                };
                let mut state = self.state.write().await;
                state.error = None;
                state.last_result = Some(result.clone());
                state.record(EnhancedRecord {
                    message: message.to_string(),
                    session_id: session_id.map(str::to_string),
                    timestamp,
                    processing_time_ms: elapsed_ms,
                    attempts,
                    result: Some(result.clone()),
                    error: None,
                });
                info!(
                    "[Enhanced] Completed in {}ms after {} attempt(s)",
                    elapsed_ms, attempts
                );
                Ok(result)
            }
            Err(err) => {
                let mut state = self.state.write().await;
                state.record(EnhancedRecord {
                    message: message.to_string(),
                    session_id: session_id.map(str::to_string),
                    timestamp,
                    processing_time_ms: elapsed_ms,
                    attempts,
                    result: None,
                    error: Some(err.to_string()),
                });
                warn!("[Enhanced] Failed after {} attempt(s): {}", attempts, err);
                Err(err)
            }
        };

        self.progress.finish();
        result
    }

    async fn send_with_retry(
        &self,
        request: &EnhancedRequest,
    ) -> (Result<ChatReply>, u32) {
        let max_attempts = self.config.max_retries + 1;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.backend.send_enhanced(request).await {
                Ok(reply) => return (Ok(reply), attempt),
                Err(err) => {
                    self.note_failure(&err, attempt).await;
                    if err.is_unauthorized() || attempt >= max_attempts {
                        return (Err(err), attempt);
                    }
                    self.state.write().await.retry_count = attempt;
                    let backoff = self.config.retry_backoff();
                    debug!("[Enhanced] Retry {} in {:?}", attempt, backoff);
                    if backoff > Duration::ZERO {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
    }

    async fn note_failure(&self, err: &ChatError, attempt: u32) {
        warn!("[Enhanced] Attempt {} failed: {}", attempt, err);
        self.state.write().await.error =
            Some(SurfacedError::with_cause(ErrorKind::EnhancedProcessing, err));
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

    /// Retries made during the latest `process` call.
    pub async fn retry_count(&self) -> u32 {
        self.state.read().await.retry_count
    }

    pub async fn last_result(&self) -> Option<EnhancedResult> {
        self.state.read().await.last_result.clone()
    }

    /// History entries, newest first.
    pub async fn history(&self) -> Vec<EnhancedRecord> {
        self.state.read().await.history.iter().cloned().collect()
    }

    pub async fn stats(&self) -> EnhancedStats {
        let state = self.state.read().await;
        EnhancedStats::from_history(&state.history, state.last_result.as_ref())
    }

    /// Restores mode, settings, history and error slot to their defaults.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = EnhancedState::new(self.config.settings.clone());
        self.progress.clear();
        info!("[Enhanced] State reset");
    }

    pub fn progress(&self) -> ProgressState {
        self.progress.state()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressState> {
        self.progress.subscribe()
    }
}
