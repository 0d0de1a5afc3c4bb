//! Interactive chat REPL.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::{Arc, RwLock as StdRwLock};

use anyhow::Result;
use colored::Colorize;
use convo_core::session::ChatMode;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use super::AppContext;
use super::render;
use super::sessions::send_and_render;

/// A slash command: its name, the argument it expects and a help line.
struct SlashCommand {
    name: &'static str,
    arg: Option<&'static str>,
    help: &'static str,
}

const COMMANDS: [SlashCommand; 9] = [
    SlashCommand { name: "/new", arg: None, help: "start a new conversation" },
    SlashCommand { name: "/sessions", arg: None, help: "list sessions" },
    SlashCommand { name: "/select", arg: Some("<id>"), help: "open a session" },
    SlashCommand { name: "/mode", arg: Some("<normal|enhanced|agentic>"), help: "switch chat mode" },
    SlashCommand { name: "/rename", arg: Some("<title>"), help: "rename the open session" },
    SlashCommand { name: "/delete", arg: None, help: "delete the open session" },
    SlashCommand { name: "/stats", arg: None, help: "enhanced chat usage" },
    SlashCommand { name: "/help", arg: None, help: "show this list" },
    SlashCommand { name: "/quit", arg: None, help: "exit" },
];

fn lookup(name: &str) -> Option<&'static SlashCommand> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Inline hint for a partially typed line: the rest of the command name
/// followed by its argument placeholder, or the placeholder alone once the
/// command is typed.
fn hint_for(line: &str) -> Option<String> {
    if !line.starts_with('/') {
        return None;
    }
    match line.split_once(' ') {
        None => {
            let cmd = COMMANDS.iter().find(|c| c.name.starts_with(line))?;
            let mut hint = cmd.name[line.len()..].to_string();
            if let Some(arg) = cmd.arg {
                hint.push(' ');
                hint.push_str(arg);
            }
            (!hint.is_empty()).then_some(hint)
        }
        Some((name, rest)) if rest.is_empty() => lookup(name)?.arg.map(str::to_string),
        Some(_) => None,
    }
}

/// Candidates for the word under the cursor: command names, chat modes
/// after `/mode`, and known session ids after `/select`.
fn candidates_for(line: &str, session_ids: &[String]) -> (usize, Vec<String>) {
    let (name, prefix) = match line.split_once(' ') {
        None if line.starts_with('/') => {
            let names = COMMANDS
                .iter()
                .map(|c| c.name)
                .filter(|name| name.starts_with(line))
                .map(str::to_string)
                .collect();
            return (0, names);
        }
        None => return (0, vec![]),
        Some(parts) => parts,
    };
    let start = line.len() - prefix.len();
    let options: Vec<String> = match name {
        "/mode" => ChatMode::ALL.iter().map(|m| m.as_str().to_string()).collect(),
        "/select" => session_ids.to_vec(),
        _ => vec![],
    };
    let matches = options
        .into_iter()
        .filter(|option| option.starts_with(prefix))
        .collect();
    (start, matches)
}

/// Rustyline helper for convo's slash commands.
///
/// Session ids for `/select` completion are refreshed by the REPL whenever
/// the list is reloaded.
#[derive(Clone, Default)]
struct CliHelper {
    session_ids: Arc<StdRwLock<Vec<String>>>,
}

impl CliHelper {
    fn set_session_ids(&self, ids: Vec<String>) {
        if let Ok(mut slot) = self.session_ids.write() {
            *slot = ids;
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let ids = self
            .session_ids
            .read()
            .map(|ids| ids.clone())
            .unwrap_or_default();
        let (start, words) = candidates_for(&line[..pos], &ids);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for CliHelper {
    /// Known commands in cyan with their argument in white, unknown ones in red.
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        let (name, rest) = line.split_at(line.find(' ').unwrap_or(line.len()));
        let known = lookup(name).is_some() || name == "/exit";
        let name = if known { name.bright_cyan() } else { name.red() };
        Owned(format!("{}{}", name, rest.white()))
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with('/')
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        hint_for(&line[..pos])
    }
}

impl Validator for CliHelper {}

enum Flow {
    Continue,
    Quit,
}

pub async fn run(app: &AppContext, session_id: Option<&str>) -> Result<()> {
    let helper = CliHelper::default();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper.clone()));

    println!("{}", "=== convo ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a message to chat, '/help' for commands, '/quit' to exit.".bright_black()
    );
    println!();

    app.chat.load_sessions(false).await;
    report(app).await;
    helper.set_session_ids(session_ids(app).await);
    match session_id {
        Some(id) => {
            app.chat.select_session(id).await;
            report(app).await;
            render::messages(&app.chat.snapshot().await.messages);
        }
        None => app.chat.start_new_session().await,
    }

    loop {
        let mode = app.enhanced().chat_mode().await;
        let prompt = format!("[{}] >> ", mode);

        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if trimmed.starts_with('/') {
                    if let Flow::Quit = command(app, trimmed).await {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    helper.set_session_ids(session_ids(app).await);
                } else if !send_and_render(app, trimmed, mode).await {
                    report(app).await;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

async fn command(app: &AppContext, line: &str) -> Flow {
    let (name, arg) = match line.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    match name {
        "/quit" | "/exit" => return Flow::Quit,
        "/new" => {
            app.chat.start_new_session().await;
            println!("{}", "New conversation. It is created on the first message.".bright_black());
        }
        "/sessions" => {
            app.chat.load_sessions(true).await;
            let snapshot = app.chat.snapshot().await;
            render::sessions(&snapshot.sessions, snapshot.selected_session_id.as_deref());
        }
        "/select" if !arg.is_empty() => {
            app.chat.select_session(arg).await;
            render::messages(&app.chat.snapshot().await.messages);
        }
        "/mode" => match arg.parse::<ChatMode>() {
            Ok(mode) => {
                app.enhanced().toggle_chat_mode(mode).await;
                println!("{}", format!("Mode: {}", mode).bright_black());
            }
            Err(err) => println!("{}", err.yellow()),
        },
        "/rename" if !arg.is_empty() => match selected(app).await {
            Some(id) => {
                if app.chat.rename_session(&id, arg).await {
                    println!("{}", format!("Renamed to {}", arg).bright_black());
                }
            }
            None => println!("{}", "No session selected.".yellow()),
        },
        "/delete" => match selected(app).await {
            Some(id) => {
                if app.chat.delete_session(&id).await {
                    println!("{}", format!("Deleted {}", id).bright_black());
                }
            }
            None => println!("{}", "No session selected.".yellow()),
        },
        "/stats" => render::stats(&app.enhanced().stats().await),
        "/help" => help(),
        _ => println!("{}", "Unknown command. Type '/help' for commands.".bright_black()),
    }

    report(app).await;
    Flow::Continue
}

async fn session_ids(app: &AppContext) -> Vec<String> {
    app.chat
        .snapshot()
        .await
        .sessions
        .into_iter()
        .map(|s| s.id)
        .collect()
}

async fn selected(app: &AppContext) -> Option<String> {
    app.chat.snapshot().await.selected_session_id
}

/// Prints and clears a surfaced error without leaving the REPL.
async fn report(app: &AppContext) {
    if let Err(err) = app.check_error().await {
        eprintln!("{}", err.to_string().red());
    }
}

fn help() {
    for cmd in &COMMANDS {
        let usage = match cmd.arg {
            Some(arg) => format!("{} {}", cmd.name, arg),
            None => cmd.name.to_string(),
        };
        println!("  {:<34}{}", usage.bright_cyan(), cmd.help.bright_black());
    }
}
