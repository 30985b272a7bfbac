//! Session and message types for Parley.
//!
//! A session is a named conversation thread; messages are its append-only
//! log. The system prompt is never stored, so persisted roles are in
//! practice only `user` and `assistant`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::llm::CompletionOutcome;

// Re-export MessageRole from llm module (used both on the wire and in storage).
pub use crate::llm::MessageRole;

/// Title shown for sessions that have no recorded title yet.
///
/// Presentation only; never written to storage.
pub const DEFAULT_SESSION_TITLE: &str = "New Session";

/// Opaque session identifier (e.g. `Session0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Human-readable sequential name: `Session<N>`.
    pub fn sequential(n: u64) -> Self {
        Self(format!("Session{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A conversation thread.
///
/// `title` is `None` until inferred from the first stored message; once set
/// it is never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: Option<String>,
}

impl Session {
    /// Title for display, falling back to [`DEFAULT_SESSION_TITLE`].
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_SESSION_TITLE)
    }
}

/// A single stored turn.
///
/// Ordered by insertion sequence within a session; `created_at` has coarse
/// resolution and may tie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub session_id: SessionId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// What `send_message` hands back to its caller.
///
/// The answer survives a failed persistence step; the failure is carried
/// as a warning instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub outcome: CompletionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_warning: Option<String>,
}

impl ChatReply {
    pub fn text(&self) -> &str {
        self.outcome.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_session_id() {
        assert_eq!(SessionId::sequential(0).as_str(), "Session0");
        assert_eq!(SessionId::sequential(12).to_string(), "Session12");
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionId::from("Session3")).unwrap();
        assert_eq!(json, "\"Session3\"");
    }

    #[test]
    fn test_display_title_default() {
        let untitled = Session {
            id: SessionId::from("Session0"),
            title: None,
        };
        assert_eq!(untitled.display_title(), "New Session");

        let empty = Session {
            id: SessionId::from("Session1"),
            title: Some(String::new()),
        };
        assert_eq!(empty.display_title(), "");
    }

    #[test]
    fn test_chat_reply_text() {
        let reply = ChatReply {
            outcome: CompletionOutcome::Empty,
            persistence_warning: Some("disk full".to_string()),
        };
        assert_eq!(reply.text(), "");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["outcome"]["kind"], "empty");
        assert_eq!(json["persistence_warning"], "disk full");
    }
}
