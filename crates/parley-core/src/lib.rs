//! Business logic and storage trait definitions for Parley.
//!
//! This crate defines the "ports" (storage and completion-client traits)
//! that the infrastructure layer implements, plus the orchestration that
//! runs a chat turn over them. It depends only on `parley-types` -- never
//! on `parley-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
