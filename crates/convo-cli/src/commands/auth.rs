use super::AppContext;
use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::DefaultEditor;

pub async fn login(app: &AppContext, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut rl = DefaultEditor::new()?;
            rl.readline("Password: ")
                .context("Failed to read password")?
        }
    };

    let response = app
        .backend
        .login(username, &password)
        .await
        .context("Login failed")?;

    let name = response
        .user
        .as_ref()
        .map(|u| u.username.as_str())
        .unwrap_or(username);
    println!("{}", format!("Logged in as {}", name).bright_green());
    Ok(())
}

pub fn logout(app: &AppContext) -> Result<()> {
    app.backend.logout()?;
    println!("{}", "Logged out.".bright_green());
    Ok(())
}
