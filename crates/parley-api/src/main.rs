//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, opens the database and wires services, then
//! dispatches to the appropriate command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;
use console::style;

use cli::{Cli, Commands, KeyCommand, SessionCommand};
use parley_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(verbosity_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let state = AppState::init().await?;
    let result = run(cli, &state).await;

    state.close().await?;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: &AppState) -> anyhow::Result<()> {
    let output = cli.output();
    match cli.command {
        Commands::Session { action } => match action {
            SessionCommand::New => cli::session::new_session(state, output).await?,
            SessionCommand::List => cli::session::list_sessions(state, output).await?,
            SessionCommand::Title { session_id } => {
                cli::session::show_title(state, &session_id, output).await?
            }
        },

        Commands::Chat { session_id, text } => {
            cli::chat::send(state, &session_id, &text, output).await?;
        }

        Commands::History { session_id, limit } => {
            cli::history::show_history(state, &session_id, limit, output).await?;
        }

        Commands::Key { action } => match action {
            KeyCommand::Set { key } => cli::key::set_key(state, key, output).await?,
            KeyCommand::Show => cli::key::show_key(state, output).await?,
        },

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!();
                println!(
                    "  {} Parley API listening on {}",
                    style("▶").green().bold(),
                    style(format!("http://{addr}/api/v1")).cyan()
                );
                println!(
                    "  {} model {} via {}",
                    style("·").dim(),
                    style(&state.config.model).bold(),
                    style(&state.config.base_url).dim()
                );
                println!();
            }

            let router = http::router::build_router(state.clone());
            let shutdown = state.shutdown.clone();
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    shutdown.cancel();
                })
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
