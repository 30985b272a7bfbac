//! History CLI command.

use anyhow::Result;
use console::style;

use parley_types::chat::{DEFAULT_SESSION_TITLE, MessageRole, SessionId};

use crate::cli::Output;
use crate::http::extractors::RequestContext;
use crate::state::AppState;

/// Print the stored messages of a session, oldest first.
pub async fn show_history(
    state: &AppState,
    session_id: &str,
    limit: Option<u32>,
    output: Output,
) -> Result<()> {
    let ctx = RequestContext::new();
    let id = SessionId::from(session_id);
    let messages = match limit {
        Some(limit) => state.chat_service.get_history_limited(&id, limit).await,
        None => state.chat_service.get_history(&id).await,
    };
    let messages = output.check(&ctx, messages)?;

    if output.json {
        return output.print_envelope(&ctx, messages, None);
    }

    if messages.is_empty() {
        if output.quiet {
            return Ok(());
        }
        println!();
        println!(
            "  {} No messages in {}.",
            style("i").blue().bold(),
            style(&id).cyan()
        );
        println!();
        return Ok(());
    }

    if output.decorate() {
        let title = output.check(&ctx, state.chat_service.get_title(&id).await)?;
        println!();
        println!(
            "  {} {}",
            style(&id).cyan().bold(),
            style(title.as_deref().unwrap_or(DEFAULT_SESSION_TITLE)).dim()
        );
        println!();
    }
    for message in &messages {
        let who = match message.role {
            MessageRole::User => style("you").green().bold(),
            MessageRole::Assistant => style("assistant").magenta().bold(),
            MessageRole::System => style("system").dim(),
        };
        println!(
            "  {} {}",
            who,
            style(message.created_at.format("%Y-%m-%d %H:%M")).dim()
        );
        for line in message.content.lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(())
}
