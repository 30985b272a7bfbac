//! API key CLI commands: set, show.

use anyhow::Result;
use console::style;
use secrecy::SecretString;

use crate::cli::Output;
use crate::http::error::AppError;
use crate::http::extractors::RequestContext;
use crate::http::handlers::api_key::ApiKeyStatus;
use crate::state::AppState;

/// Store the API key.
///
/// # Examples
///
/// ```bash
/// parley key set sk-...
/// ```
pub async fn set_key(state: &AppState, key: String, output: Output) -> Result<()> {
    let ctx = RequestContext::new();
    if key.trim().is_empty() {
        let blank: Result<(), AppError> =
            Err(AppError::Validation("api key must not be empty".to_string()));
        return output.check(&ctx, blank);
    }

    let key = SecretString::from(key);
    let status = ApiKeyStatus::from_key(Some(&key));
    output.check(&ctx, state.chat_service.set_api_key(key).await)?;

    if output.json {
        return output.print_envelope(&ctx, status, None);
    }
    if output.decorate() {
        println!(
            "  {} API key stored ({})",
            style("✓").green().bold(),
            status.masked.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

/// Show whether a key is configured, masked.
pub async fn show_key(state: &AppState, output: Output) -> Result<()> {
    let ctx = RequestContext::new();
    let key = output.check(&ctx, state.chat_service.get_api_key().await)?;
    let status = ApiKeyStatus::from_key(key.as_ref());

    if output.json {
        return output.print_envelope(&ctx, status, None);
    }
    if output.quiet {
        println!("{}", status.masked.as_deref().unwrap_or("none"));
        return Ok(());
    }

    match status.masked {
        Some(masked) => println!("  {} API key: {}", style("✓").green().bold(), masked),
        None => println!(
            "  {} No API key configured. Set one with: {}",
            style("i").blue().bold(),
            style("parley key set <key>").yellow()
        ),
    }
    println!(
        "  {} {}",
        style("data dir:").dim(),
        style(state.data_dir.display()).dim()
    );
    Ok(())
}
