//! Session directory, conversation history and the orchestration that
//! stitches them into completion requests.

pub mod orchestrator;
pub mod prompt;
pub mod repository;
pub mod service;
pub mod title;
