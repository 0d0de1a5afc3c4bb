use super::AppContext;
use super::render::{self, ProgressPrinter};
use anyhow::Result;
use colored::Colorize;
use convo_core::session::ChatMode;

pub async fn list(app: &AppContext) -> Result<()> {
    app.chat.load_sessions(true).await;
    app.check_error().await?;
    let snapshot = app.chat.snapshot().await;
    render::sessions(&snapshot.sessions, snapshot.selected_session_id.as_deref());
    Ok(())
}

pub async fn history(app: &AppContext, session_id: &str) -> Result<()> {
    app.chat.select_session(session_id).await;
    app.check_error().await?;
    render::messages(&app.chat.snapshot().await.messages);
    Ok(())
}

pub async fn create(app: &AppContext, title: Option<&str>) -> Result<()> {
    let session = match app.chat.create_session(title).await {
        Ok(session) => session,
        Err(err) => {
            app.check_error().await?;
            return Err(err.into());
        }
    };
    println!(
        "{} {}",
        "Created".bright_green(),
        format!("{} ({})", session.title, session.id).bold()
    );
    Ok(())
}

/// Sends one message. Without `session_id` a new session is created first.
pub async fn send(
    app: &AppContext,
    session_id: Option<&str>,
    mode: ChatMode,
    text: &str,
) -> Result<()> {
    match session_id {
        Some(id) => {
            app.chat.select_session(id).await;
            app.check_error().await?;
        }
        None => app.chat.start_new_session().await,
    }

    if send_and_render(app, text, mode).await {
        Ok(())
    } else {
        app.check_error().await
    }
}

/// Sends `text` and prints the reply. Returns false if the send failed.
pub async fn send_and_render(app: &AppContext, text: &str, mode: ChatMode) -> bool {
    let printer = (mode == ChatMode::Enhanced)
        .then(|| ProgressPrinter::spawn(app.enhanced().subscribe_progress()));

    let reply = app.chat.send_message(text, mode).await;

    if let Some(printer) = printer {
        printer.finish().await;
    }
    match reply {
        Some(message) => {
            render::message(&message);
            true
        }
        None => false,
    }
}

pub async fn rename(app: &AppContext, session_id: &str, title: &str) -> Result<()> {
    if app.chat.rename_session(session_id, title).await {
        println!("{}", format!("Renamed {} to {}", session_id, title).bright_green());
        Ok(())
    } else {
        app.check_error().await
    }
}

pub async fn delete(app: &AppContext, session_id: &str) -> Result<()> {
    if app.chat.delete_session(session_id).await {
        println!("{}", format!("Deleted {}", session_id).bright_green());
        Ok(())
    } else {
        app.check_error().await
    }
}
