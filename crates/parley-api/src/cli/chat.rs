//! One-shot chat command: send a message, print the reply.

use anyhow::Result;
use console::style;
use tokio_util::sync::CancellationToken;

use parley_types::chat::SessionId;
use parley_types::llm::CompletionOutcome;

use crate::cli::Output;
use crate::http::extractors::RequestContext;
use crate::http::handlers::message::SendMessageResponse;
use crate::state::AppState;

/// Send `text` to a session and print the assistant's answer.
///
/// Ctrl+C aborts the in-flight request; nothing is stored in that case.
pub async fn send(state: &AppState, session_id: &str, text: &str, output: Output) -> Result<()> {
    let ctx = RequestContext::new();
    let id = SessionId::from(session_id);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = state
        .chat_service
        .send_message_with_cancel(&id, text, cancel)
        .await;
    interrupt.abort();

    let reply = output.check(&ctx, result)?;

    if output.json {
        let response = SendMessageResponse {
            session_id: id,
            reply: reply.text().to_string(),
            outcome: reply.outcome,
        };
        return output.print_envelope(&ctx, response, reply.persistence_warning);
    }

    match &reply.outcome {
        CompletionOutcome::Answered(text) => println!("{text}"),
        CompletionOutcome::Empty if output.decorate() => {
            eprintln!("  {} The model returned no answer.", style("i").blue().bold());
        }
        CompletionOutcome::Empty => {}
    }
    if let Some(warning) = &reply.persistence_warning {
        eprintln!(
            "  {} Reply not saved: {}",
            style("!").yellow().bold(),
            warning
        );
    }
    Ok(())
}
