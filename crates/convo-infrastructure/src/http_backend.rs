//! HttpChatBackend - REST implementation of the chat backend.
//!
//! Every request carries `Authorization: Bearer <token>` when the token store
//! holds one. A 401 from any endpoint clears the stored token.

use crate::dto::{
    CreateSessionRequest, CreateSessionResponse, ErrorBody, HistoryResponse, LoginRequest,
    RenameSessionRequest, SendMessageRequest, SessionListResponse,
};
use async_trait::async_trait;
use convo_core::auth::{LoginResponse, TokenStore};
use convo_core::config::ApiConfig;
use convo_core::enhanced::EnhancedRequest;
use convo_core::error::{ChatError, Result};
use convo_core::session::{ChatBackend, ChatMode, ChatReply, HistoryRecord, Session};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Backend implementation that talks to the chat REST API.
#[derive(Clone)]
pub struct HttpChatBackend {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpChatBackend {
    /// Creates a backend for `base_url` (including the `/api` prefix).
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url.into()),
            tokens,
        }
    }

    /// Creates a backend from the `[api]` config section.
    pub fn from_config(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ChatError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: normalize_base_url(config.base_url.clone()),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Logs in and stores the returned token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest { username, password });
        let response: LoginResponse = self.execute(request, "POST /auth/login").await?;
        self.tokens.set_token(&response.token)?;
        tracing::info!(
            "[HttpChatBackend] Logged in as {}",
            response
                .user
                .as_ref()
                .map(|u| u.username.as_str())
                .unwrap_or("<unknown>")
        );
        Ok(response)
    }

    /// Forgets the stored token.
    pub fn logout(&self) -> Result<()> {
        self.tokens.clear()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.token().is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.tokens.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, label: &str) -> Result<T> {
        tracing::debug!("[HttpChatBackend] {}", label);

        let response = request.send().await.map_err(|err| {
            tracing::warn!("[HttpChatBackend] {} failed: {}", label, err);
            ChatError::network(format!("{label} failed: {err}"))
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                "[HttpChatBackend] {} answered 401, clearing stored token",
                label
            );
            if let Err(e) = self.tokens.clear() {
                tracing::warn!("[HttpChatBackend] Failed to clear token: {}", e);
            }
            return Err(ChatError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message =
                ErrorBody::message_for(status.as_u16(), status.canonical_reason().unwrap_or(""), &body);
            tracing::warn!("[HttpChatBackend] {} -> {}: {}", label, status, message);
            return Err(ChatError::http(status.as_u16(), message));
        }

        // Some endpoints answer 204 or an empty body.
        let bytes = response.bytes().await.map_err(ChatError::from)?;
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null".as_slice()
        } else {
            bytes.as_ref()
        };
        serde_json::from_slice(body).map_err(|err| {
            ChatError::json(format!("Failed to parse response of {label}: {err}"))
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let request = self.request(Method::GET, "/chat/sessions");
        let response: SessionListResponse = self.execute(request, "GET /chat/sessions").await?;
        Ok(response.into_sessions())
    }

    async fn fetch_history(&self, session_id: &str, limit: u32) -> Result<Vec<HistoryRecord>> {
        let path = format!("/chat/sessions/{session_id}");
        let request = self
            .request(Method::GET, &path)
            .query(&[("limit", limit)]);
        let response: HistoryResponse = self.execute(request, &format!("GET {path}")).await?;
        Ok(response.into_records())
    }

    async fn create_session(&self, title: &str) -> Result<Session> {
        let request = self
            .request(Method::POST, "/chat/sessions")
            .json(&CreateSessionRequest { title });
        let response: CreateSessionResponse =
            self.execute(request, "POST /chat/sessions").await?;
        Ok(response.into_session())
    }

    async fn send_message(
        &self,
        session_id: &str,
        message: &str,
        session_type: ChatMode,
    ) -> Result<ChatReply> {
        let path = format!("/chat/sessions/{session_id}/send");
        let request = self.request(Method::POST, &path).json(&SendMessageRequest {
            message,
            session_type,
        });
        let payload: Value = self.execute(request, &format!("POST {path}")).await?;
        Ok(ChatReply::from_payload(payload))
    }

    async fn rename_session(&self, session_id: &str, title: &str) -> Result<()> {
        let path = format!("/chat/sessions/{session_id}/title");
        let request = self
            .request(Method::PUT, &path)
            .json(&RenameSessionRequest { title });
        let _: Value = self.execute(request, &format!("PUT {path}")).await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let path = format!("/chat/sessions/{session_id}");
        let request = self.request(Method::DELETE, &path);
        let _: Value = self.execute(request, &format!("DELETE {path}")).await?;
        Ok(())
    }

    async fn send_enhanced(&self, request: &EnhancedRequest) -> Result<ChatReply> {
        let builder = self.request(Method::POST, "/chat/enhanced").json(request);
        let payload: Value = self.execute(builder, "POST /chat/enhanced").await?;
        Ok(ChatReply::from_payload(payload))
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
