//! Infrastructure layer for Parley.
//!
//! Contains implementations of the traits defined in `parley-core`:
//! SQLite storage for sessions, messages and the API key, and the HTTP
//! client for the chat-completion endpoint. Also loads configuration.

pub mod config;
pub mod llm;
pub mod sqlite;
