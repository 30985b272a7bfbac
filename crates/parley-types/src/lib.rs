//! Shared domain types for Parley.
//!
//! Sessions, messages, completion wire types, configuration and the error
//! taxonomy shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
