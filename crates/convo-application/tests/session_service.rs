mod common;

use common::{CallCounts, MockBackend, chat_service, history};
use convo_core::session::{ChatMode, Sender};
use convo_core::{ChatError, ErrorKind};
use serde_json::json;

#[tokio::test]
async fn load_sessions_fetches_once_unless_forced() {
    let backend = MockBackend::new().with_session("s1", vec![]);
    let service = chat_service(backend.clone());

    service.load_sessions(false).await;
    service.load_sessions(false).await;
    service.load_sessions(false).await;
    assert_eq!(CallCounts::get(&backend.calls.list_sessions), 1);

    service.load_sessions(true).await;
    service.load_sessions(true).await;
    assert_eq!(CallCounts::get(&backend.calls.list_sessions), 3);

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.sessions.len(), 1);
    assert!(!snapshot.is_loading_sessions);
}

#[tokio::test]
async fn load_sessions_failure_is_surfaced_not_returned() {
    let backend = MockBackend::new();
    backend.fail_list(ChatError::network("connection refused"));
    let service = chat_service(backend.clone());

    service.load_sessions(false).await;

    let error = service.error().await.expect("error surfaced");
    assert_eq!(error.kind, ErrorKind::LoadSessions);
    assert!(error.message.contains("connection refused"));
    assert!(service.snapshot().await.sessions.is_empty());
}

#[tokio::test]
async fn select_session_normalizes_history() {
    let backend = MockBackend::new().with_session(
        "s1",
        vec![
            convo_core::session::HistoryRecord {
                message: Some("hello".into()),
                response: Some("hi there".into()),
                created_at: Some("2024-05-01T10:00:00Z".into()),
                ..Default::default()
            },
            convo_core::session::HistoryRecord {
                message: Some("anyone?".into()),
                response: Some("   ".into()),
                ..Default::default()
            },
            convo_core::session::HistoryRecord {
                message: Some(String::new()),
                response: Some("system notice".into()),
                ..Default::default()
            },
        ],
    );
    let service = chat_service(backend);

    service.select_session("s1").await;

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.selected_session_id.as_deref(), Some("s1"));
    assert!(!snapshot.is_loading_chat);
    let rendered: Vec<(Sender, &str)> = snapshot
        .messages
        .iter()
        .map(|m| (m.sender, m.text.as_str()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            (Sender::User, "hello"),
            (Sender::Bot, "hi there"),
            (Sender::User, "anyone?"),
            (Sender::Bot, "system notice"),
        ]
    );
    assert_eq!(
        snapshot.messages[0].timestamp.as_deref(),
        Some("2024-05-01T10:00:00Z")
    );
}

#[tokio::test]
async fn selecting_same_session_twice_is_idempotent() {
    let backend = MockBackend::new().with_session("s1", history(&[("q1", "a1"), ("q2", "a2")]));
    let service = chat_service(backend);

    service.select_session("s1").await;
    let first: Vec<String> = service
        .snapshot()
        .await
        .messages
        .into_iter()
        .map(|m| m.text)
        .collect();

    service.select_session("s1").await;
    let second: Vec<String> = service
        .snapshot()
        .await
        .messages
        .into_iter()
        .map(|m| m.text)
        .collect();

    assert_eq!(first, vec!["q1", "a1", "q2", "a2"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn stale_history_fetch_does_not_overwrite_newer_selection() {
    let backend = MockBackend::new()
        .with_session("slow", history(&[("old question", "old answer")]))
        .with_session("fast", history(&[("new question", "new answer")]));
    let gate = backend.gate_history("slow");
    let service = chat_service(backend);

    let slow = tokio::spawn({
        let service = service.clone();
        async move { service.select_session("slow").await }
    });
    gate.reached().await;
    assert!(service.snapshot().await.is_loading_chat);

    service.select_session("fast").await;
    gate.open();
    slow.await.unwrap();

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.selected_session_id.as_deref(), Some("fast"));
    let texts: Vec<&str> = snapshot.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["new question", "new answer"]);
    assert!(!snapshot.is_loading_chat);
}

#[tokio::test]
async fn history_failure_clears_messages_and_surfaces_error() {
    let backend = MockBackend::new().with_session("s1", history(&[("q", "a")]));
    let service = chat_service(backend.clone());
    service.select_session("s1").await;
    assert_eq!(service.snapshot().await.messages.len(), 2);

    backend.fail_history(ChatError::http(500, "boom"));
    service.select_session("s1").await;

    let snapshot = service.snapshot().await;
    assert!(snapshot.messages.is_empty());
    assert_eq!(snapshot.error.unwrap().kind, ErrorKind::LoadMessages);
}

#[tokio::test]
async fn send_shows_optimistic_messages_then_reply() {
    let backend = MockBackend::new().with_session("S1", vec![]);
    backend.set_reply(json!({ "response": "hi" }));
    let gate = backend.gate_sends();
    let service = chat_service(backend);
    service.select_session("S1").await;

    let send = tokio::spawn({
        let service = service.clone();
        async move { service.send_message("hello", ChatMode::Normal).await }
    });
    gate.reached().await;

    let snapshot = service.snapshot().await;
    assert!(snapshot.is_loading_chat);
    assert_eq!(snapshot.loading_session_id.as_deref(), Some("S1"));
    let in_flight = snapshot.messages;
    assert_eq!(in_flight.len(), 2);
    assert_eq!(in_flight[0].sender, Sender::User);
    assert_eq!(in_flight[0].text, "hello");
    assert_eq!(in_flight[1].sender, Sender::Bot);
    assert!(in_flight[1].is_loading);

    gate.open();
    let reply = send.await.unwrap().expect("reply returned");
    assert_eq!(reply.text, "hi");

    let snapshot = service.snapshot().await;
    assert!(!snapshot.is_loading_chat);
    assert_eq!(snapshot.loading_session_id, None);
    let settled = snapshot.messages;
    assert_eq!(settled.len(), 2);
    assert_eq!(settled[0].text, "hello");
    assert_eq!(settled[1].sender, Sender::Bot);
    assert_eq!(settled[1].text, "hi");
    assert!(!settled[1].is_loading);
    assert_eq!(settled[1].id, in_flight[1].id);
}

#[tokio::test]
async fn failed_send_removes_placeholder_and_surfaces_error() {
    let backend = MockBackend::new().with_session("S1", vec![]);
    backend.fail_next_send(ChatError::http(500, "model unavailable"));
    let service = chat_service(backend);
    service.select_session("S1").await;

    let reply = service.send_message("hello", ChatMode::Normal).await;
    assert!(reply.is_none());

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].sender, Sender::User);
    assert_eq!(snapshot.messages[0].text, "hello");
    let error = snapshot.error.expect("error surfaced");
    assert_eq!(error.kind, ErrorKind::SendMessage);
    assert!(error.message.contains("model unavailable"));
}

#[tokio::test]
async fn user_message_count_matches_attempted_sends() {
    let backend = MockBackend::new().with_session("S1", vec![]);
    let service = chat_service(backend.clone());
    service.select_session("S1").await;

    service.send_message("one", ChatMode::Normal).await;
    backend.fail_next_send(ChatError::network("reset"));
    service.send_message("two", ChatMode::Normal).await;
    service.send_message("three", ChatMode::Normal).await;

    let messages = service.snapshot().await.messages;
    let users = messages.iter().filter(|m| m.sender == Sender::User).count();
    assert_eq!(users, 3);
    assert!(messages.iter().all(|m| !m.is_loading));

    let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["one", "echo: one", "two", "three", "echo: three"]
    );
}

#[tokio::test]
async fn reply_without_text_uses_fallback() {
    let backend = MockBackend::new().with_session("S1", vec![]);
    backend.set_reply(json!({ "status": "ok" }));
    let service = chat_service(backend);
    service.select_session("S1").await;

    let reply = service.send_message("hello", ChatMode::Normal).await.unwrap();
    assert_eq!(reply.text, "No response received.");
}

#[tokio::test]
async fn composing_send_creates_session_first() {
    let backend = MockBackend::new();
    let service = chat_service(backend.clone());

    service.start_new_session().await;
    assert!(service.snapshot().await.is_composing_new);

    let reply = service.send_message("first words", ChatMode::Normal).await;
    assert!(reply.is_some());

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.selected_session_id.as_deref(), Some("created-1"));
    assert!(!snapshot.is_composing_new);
    let texts: Vec<&str> = snapshot.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first words", "echo: first words"]);
    assert_eq!(snapshot.sessions.len(), 1, "list reloaded after create");
    assert_eq!(backend.last_send_session().as_deref(), Some("created-1"));
    assert_eq!(CallCounts::get(&backend.calls.create_session), 1);
}

#[tokio::test]
async fn composing_send_aborts_when_create_fails() {
    let backend = MockBackend::new();
    backend.fail_create(ChatError::http(503, "unavailable"));
    let service = chat_service(backend.clone());
    service.start_new_session().await;

    assert!(service.send_message("hello", ChatMode::Normal).await.is_none());

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].sender, Sender::User);
    assert_eq!(snapshot.messages[0].text, "hello");
    assert!(!snapshot.messages[0].is_loading);
    assert!(snapshot.is_composing_new);
    assert!(!snapshot.is_loading_chat);
    assert_eq!(snapshot.error.unwrap().kind, ErrorKind::SendMessage);
    assert_eq!(CallCounts::get(&backend.calls.send_message), 0);
}

#[tokio::test]
async fn send_without_selection_fails() {
    let backend = MockBackend::new();
    let service = chat_service(backend.clone());

    assert!(service.send_message("hello", ChatMode::Normal).await.is_none());

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].sender, Sender::User);
    assert_eq!(snapshot.messages[0].text, "hello");
    let error = snapshot.error.unwrap();
    assert_eq!(error.kind, ErrorKind::SendMessage);
    assert!(error.message.contains("No chat session selected"));
    assert_eq!(CallCounts::get(&backend.calls.create_session), 0);
}

#[tokio::test]
async fn create_session_returns_its_error() {
    let backend = MockBackend::new();
    backend.fail_create(ChatError::http(400, "title too long"));
    let service = chat_service(backend);

    let err = service.create_session(Some("x")).await.unwrap_err();
    assert!(matches!(err, ChatError::Http { status: 400, .. }));
    assert_eq!(service.error().await.unwrap().kind, ErrorKind::CreateSession);
}

#[tokio::test]
async fn reply_is_dropped_when_user_switched_sessions() {
    let backend = MockBackend::new()
        .with_session("S1", vec![])
        .with_session("S2", history(&[("other", "thread")]));
    let gate = backend.gate_sends();
    let service = chat_service(backend);
    service.select_session("S1").await;

    let send = tokio::spawn({
        let service = service.clone();
        async move { service.send_message("hello", ChatMode::Normal).await }
    });
    gate.reached().await;
    service.select_session("S2").await;
    gate.open();

    let reply = send.await.unwrap();
    assert_eq!(reply.unwrap().text, "echo: hello");

    let texts: Vec<String> = service
        .snapshot()
        .await
        .messages
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts, vec!["other", "thread"]);
}

#[tokio::test]
async fn agentic_mode_is_rejected_without_network_call() {
    let backend = MockBackend::new().with_session("S1", vec![]);
    let service = chat_service(backend.clone());
    service.select_session("S1").await;

    assert!(service.send_message("plan a trip", ChatMode::Agentic).await.is_none());

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.error.unwrap().kind, ErrorKind::SendMessage);
    assert_eq!(CallCounts::get(&backend.calls.send_message), 0);
    assert_eq!(CallCounts::get(&backend.calls.send_enhanced), 0);
}

#[tokio::test]
async fn enhanced_send_attaches_result() {
    let backend = MockBackend::new().with_session("S1", vec![]);
    let service = chat_service(backend.clone());
    service.select_session("S1").await;

    let reply = service
        .send_message("find my invoices", ChatMode::Enhanced)
        .await
        .unwrap();

    assert_eq!(reply.text, "enhanced: find my invoices");
    assert_eq!(reply.mode, Some(ChatMode::Enhanced));
    let enhanced = reply.enhanced.expect("enhanced result attached");
    assert_eq!(enhanced.session_id.as_deref(), Some("S1"));
    assert_eq!(
        backend.last_enhanced().unwrap().session_id.as_deref(),
        Some("S1")
    );
    assert_eq!(service.enhanced().history().await.len(), 1);
}

#[tokio::test]
async fn rename_and_delete_update_local_list() {
    let backend = MockBackend::new()
        .with_session("a", history(&[("q", "a")]))
        .with_session("b", vec![]);
    let service = chat_service(backend.clone());
    service.load_sessions(false).await;
    service.select_session("a").await;

    assert!(service.rename_session("b", "Renamed").await);
    assert!(service.delete_session("a").await);

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.sessions.len(), 1);
    assert_eq!(snapshot.sessions[0].title, "Renamed");
    assert_eq!(snapshot.selected_session_id, None);
    assert!(snapshot.messages.is_empty());
    assert_eq!(backend.session_ids(), vec!["b"]);
}

#[tokio::test]
async fn failed_mutations_surface_their_kind() {
    let backend = MockBackend::new().with_session("a", vec![]);
    backend.fail_mutations(ChatError::http(404, "Session not found"));
    let service = chat_service(backend);
    service.load_sessions(false).await;

    assert!(!service.rename_session("a", "x").await);
    assert_eq!(service.error().await.unwrap().kind, ErrorKind::UpdateSession);

    assert!(!service.delete_session("a").await);
    assert_eq!(service.error().await.unwrap().kind, ErrorKind::DeleteSession);
    assert_eq!(service.snapshot().await.sessions.len(), 1);

    service.clear_error().await;
    assert!(service.error().await.is_none());
}

#[tokio::test]
async fn start_new_session_clears_selection_and_error() {
    let backend = MockBackend::new().with_session("a", history(&[("q", "a")]));
    let service = chat_service(backend.clone());
    service.select_session("a").await;
    backend.fail_mutations(ChatError::http(404, "Session not found"));
    assert!(!service.rename_session("a", "x").await);
    assert!(service.error().await.is_some());

    service.start_new_session().await;

    let snapshot = service.snapshot().await;
    assert!(snapshot.is_composing_new);
    assert_eq!(snapshot.selected_session_id, None);
    assert!(snapshot.messages.is_empty());
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn successful_select_clears_earlier_load_error() {
    let backend = MockBackend::new().with_session("a", history(&[("q", "a")]));
    backend.fail_list(ChatError::network("down"));
    let service = chat_service(backend);

    service.load_sessions(false).await;
    assert_eq!(service.error().await.unwrap().kind, ErrorKind::LoadSessions);

    service.select_session("a").await;
    assert!(service.error().await.is_none());
    assert_eq!(service.snapshot().await.messages.len(), 2);
}

#[tokio::test]
async fn successful_send_clears_earlier_send_error() {
    let backend = MockBackend::new().with_session("S1", vec![]);
    backend.fail_next_send(ChatError::network("reset"));
    let service = chat_service(backend);
    service.select_session("S1").await;

    assert!(service.send_message("one", ChatMode::Normal).await.is_none());
    assert_eq!(service.error().await.unwrap().kind, ErrorKind::SendMessage);

    assert!(service.send_message("two", ChatMode::Normal).await.is_some());
    assert!(service.error().await.is_none());
}

#[tokio::test]
async fn forced_reload_and_create_clear_earlier_error() {
    let backend = MockBackend::new().with_session("a", vec![]);
    backend.fail_history(ChatError::http(500, "boom"));
    let service = chat_service(backend.clone());

    service.select_session("a").await;
    assert_eq!(service.error().await.unwrap().kind, ErrorKind::LoadMessages);
    service.load_sessions(true).await;
    assert!(service.error().await.is_none());

    service.select_session("a").await;
    assert!(service.error().await.is_some());
    service.create_session(Some("fresh")).await.unwrap();
    assert!(service.error().await.is_none());
}

#[tokio::test]
async fn every_attempted_send_leaves_its_user_message() {
    let backend = MockBackend::new();
    backend.fail_create(ChatError::http(503, "unavailable"));
    let service = chat_service(backend);
    service.start_new_session().await;

    service.send_message("first", ChatMode::Normal).await;
    service.send_message("second", ChatMode::Normal).await;

    let users: Vec<String> = service
        .snapshot()
        .await
        .messages
        .into_iter()
        .filter(|m| m.sender == Sender::User)
        .map(|m| m.text)
        .collect();
    assert_eq!(users, vec!["first", "second"]);
}
