//! Session CLI commands: new, list, title.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use parley_types::chat::{Session, SessionId};

use crate::cli::Output;
use crate::http::extractors::RequestContext;
use crate::http::handlers::session::SessionTitle;
use crate::state::AppState;

/// Titles longer than this are shortened in the table.
const TITLE_COLUMN_CHARS: usize = 40;

/// Reserve a new session and print its identifier.
pub async fn new_session(state: &AppState, output: Output) -> Result<()> {
    let ctx = RequestContext::new();
    let id = output.check(&ctx, state.chat_service.create_session().await)?;

    if output.json {
        return output.print_envelope(&ctx, Session { id, title: None }, None);
    }
    if output.quiet {
        println!("{id}");
    } else {
        println!(
            "  {} Created session {}",
            style("✓").green().bold(),
            style(&id).cyan().bold()
        );
    }
    Ok(())
}

/// List sessions in creation order with their titles.
///
/// # Examples
///
/// ```bash
/// parley session list
/// parley session list --json
/// ```
pub async fn list_sessions(state: &AppState, output: Output) -> Result<()> {
    let ctx = RequestContext::new();
    let sessions = output.check(&ctx, state.chat_service.list_sessions_with_titles().await)?;

    if output.json {
        return output.print_envelope(&ctx, sessions, None);
    }

    if sessions.is_empty() {
        if output.quiet {
            return Ok(());
        }
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("parley session new").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Session").fg(Color::White),
        Cell::new("Title").fg(Color::White),
    ]);

    for session in &sessions {
        let title = shorten(session.display_title(), TITLE_COLUMN_CHARS);
        let title_cell = if session.title.is_some() {
            Cell::new(title).fg(Color::Cyan)
        } else {
            Cell::new(title).fg(Color::DarkGrey)
        };
        table.add_row(vec![Cell::new(session.id.as_str()).fg(Color::White), title_cell]);
    }

    if output.quiet {
        println!("{table}");
        return Ok(());
    }
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Print the title of one session.
pub async fn show_title(state: &AppState, session_id: &str, output: Output) -> Result<()> {
    let ctx = RequestContext::new();
    let id = SessionId::from(session_id);
    let title = output.check(&ctx, state.chat_service.get_title(&id).await)?;
    let title = SessionTitle::new(id, title);

    if output.json {
        return output.print_envelope(&ctx, title, None);
    }
    println!("{}", title.display_title);
    Ok(())
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis.
fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
