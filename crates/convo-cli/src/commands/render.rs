use colored::Colorize;
use convo_application::ProgressState;
use convo_core::enhanced::EnhancedStats;
use convo_core::session::{ChatMessage, ChatMode, Sender, Session};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

pub fn sessions(sessions: &[Session], selected: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No sessions yet.".bright_black());
        return;
    }
    for session in sessions {
        let marker = if selected == Some(session.id.as_str()) { "*" } else { " " };
        let updated = session
            .updated_at
            .as_deref()
            .or(session.created_at.as_deref())
            .unwrap_or("-");
        println!(
            "{} {}  {}  {}",
            marker.bright_green(),
            session.id.bright_cyan(),
            session.title.bold(),
            format!("[{}] {}", session.session_type, updated).bright_black()
        );
    }
}

pub fn message(message: &ChatMessage) {
    match message.sender {
        Sender::User => println!("{}", format!("> {}", message.text).green()),
        Sender::Bot if message.is_loading => println!("{}", "...".bright_black()),
        Sender::Bot => {
            if message.mode == Some(ChatMode::Enhanced) {
                println!("{}", "[enhanced]".bright_magenta());
            }
            for line in message.text.lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
}

pub fn messages(messages: &[ChatMessage]) {
    if messages.is_empty() {
        println!("{}", "No messages.".bright_black());
    }
    for m in messages {
        message(m);
    }
}

pub fn stats(stats: &EnhancedStats) {
    println!("{}", "Enhanced chat".bright_magenta().bold());
    println!("  requests:     {}", stats.total);
    println!("  successful:   {}", stats.successful);
    println!("  success rate: {:.1}%", stats.success_rate);
    println!("  avg time:     {} ms", stats.avg_processing_time_ms);
    println!(
        "  last used:    {}",
        stats.last_used.as_deref().unwrap_or("never")
    );
}

/// Prints enhanced stages as they are reached, until `done` fires.
pub struct ProgressPrinter {
    done: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ProgressPrinter {
    pub fn spawn(mut rx: watch::Receiver<ProgressState>) -> Self {
        let (done, mut done_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut shown = 0;
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        print_new_steps(&rx.borrow_and_update(), &mut shown);
                    }
                    _ = &mut done_rx => {
                        if rx.has_changed().unwrap_or(false) {
                            print_new_steps(&rx.borrow_and_update(), &mut shown);
                        }
                        break;
                    }
                }
            }
        });
        Self { done, handle }
    }

    pub async fn finish(self) {
        let _ = self.done.send(());
        let _ = self.handle.await;
    }
}

fn print_new_steps(state: &ProgressState, shown: &mut usize) {
    if state.steps.len() < *shown {
        *shown = 0;
    }
    for stage in &state.steps[*shown..] {
        println!("{}", format!("  {}", stage.label()).bright_black());
    }
    *shown = state.steps.len();
}
