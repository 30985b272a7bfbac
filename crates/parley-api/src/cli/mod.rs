//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a
//! noun-verb pattern (e.g., `parley session new`, `parley key set`).

pub mod chat;
pub mod history;
pub mod key;
pub mod session;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::http::error::AppError;
use crate::http::extractors::RequestContext;

/// Chat with a completion endpoint and keep the conversation locally.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Print results only: no banners, hints or confirmations. Logs errors only.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output(&self) -> Output {
        Output {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

/// How a command reports its result.
///
/// In JSON mode every command prints exactly one envelope on stdout, the
/// same shape the REST API returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    /// Whether styled extras (confirmations, hints, footers) are printed.
    pub fn decorate(&self) -> bool {
        !self.json && !self.quiet
    }

    /// Unwrap `result`; in JSON mode a failure is printed as an error envelope first.
    pub fn check<T, E: Into<AppError>>(
        &self,
        ctx: &RequestContext,
        result: Result<T, E>,
    ) -> anyhow::Result<T> {
        result.map_err(|e| {
            let failed = ctx.fail(e);
            if self.json {
                match serde_json::to_string_pretty(&failed.envelope()) {
                    Ok(text) => println!("{text}"),
                    Err(e) => tracing::warn!(error = %e, "failed to serialize error envelope"),
                }
            }
            anyhow::Error::new(failed.error)
        })
    }

    /// Print a success envelope carrying `data` and an optional warning.
    pub fn print_envelope<T: Serialize>(
        &self,
        ctx: &RequestContext,
        data: T,
        warning: Option<String>,
    ) -> anyhow::Result<()> {
        let envelope = ctx.success(data).with_warning(warning);
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        Ok(())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage chat sessions.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Send one message to a session and print the reply.
    Chat {
        /// Session identifier (e.g. Session0).
        session_id: String,

        /// Message text.
        text: String,
    },

    /// Show the stored messages of a session.
    History {
        /// Session identifier.
        session_id: String,

        /// Maximum number of messages (earliest first).
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Manage the completion API key.
    Key {
        #[command(subcommand)]
        action: KeyCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Create a new session.
    New,

    /// List sessions with their titles.
    #[command(alias = "ls")]
    List,

    /// Show the title of a session.
    Title {
        /// Session identifier.
        session_id: String,
    },
}

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Store the API key, replacing any existing one.
    Set {
        /// The key value.
        key: String,
    },

    /// Show whether a key is configured (masked).
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    use parley_types::error::{ChatError, StoreError};

    #[test]
    fn test_cli_is_well_formed() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_chat_with_global_flags() {
        let cli = Cli::try_parse_from(["parley", "chat", "Session0", "hello", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Chat { session_id, text } => {
                assert_eq!(session_id, "Session0");
                assert_eq!(text, "hello");
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn test_output_modes() {
        let cli = Cli::try_parse_from(["parley", "session", "new", "--quiet"]).unwrap();
        let output = cli.output();
        assert!(output.quiet && !output.json);
        assert!(!output.decorate());
        assert!(Output::default().decorate());
    }

    #[test]
    fn test_check_keeps_error_class() {
        let output = Output {
            json: true,
            quiet: false,
        };
        let ctx = RequestContext::new();
        let err = output
            .check::<(), _>(&ctx, Err(ChatError::MissingApiKey))
            .unwrap_err();
        let app = err.downcast_ref::<AppError>().unwrap();
        assert_eq!(app.code(), "CONFIG_ERROR");

        let ok = output.check(&ctx, Ok::<_, StoreError>(7)).unwrap();
        assert_eq!(ok, 7);
    }

    #[test]
    fn test_parse_history_limit() {
        let cli = Cli::try_parse_from(["parley", "history", "Session1", "--limit", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History { limit: Some(5), .. }
        ));
    }
}
