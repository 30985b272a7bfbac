//! Storage trait definitions for sessions, messages and the API key.
//!
//! All three are implemented in parley-infra over one shared SQLite pool.
//! Follows the RPITIT pattern: `fn ... -> impl Future + Send`.

use secrecy::SecretString;

use parley_types::chat::{ChatMessage, MessageRole, SessionId};
use parley_types::error::StoreError;

/// Session identities and their inferred titles.
pub trait SessionDirectory: Send + Sync {
    /// Reserve a fresh `Session<N>` identifier.
    ///
    /// N is the number of existing sessions, bumped past any name already
    /// taken. The row is created untitled.
    fn create_session(
        &self,
    ) -> impl std::future::Future<Output = Result<SessionId, StoreError>> + Send;

    /// Stored title, or `None` when no title has been recorded.
    ///
    /// An empty string is a recorded title and is returned as `Some("")`.
    fn get_title(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<String>, StoreError>> + Send;

    /// All known sessions in insertion order.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SessionId>, StoreError>> + Send;

    /// Record a title derived from `first_content` unless one already exists.
    ///
    /// Creates the session row if it is missing. Never overwrites a title.
    fn infer_title_if_absent(
        &self,
        session_id: &SessionId,
        first_content: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// Append-only message log per session.
pub trait HistoryStore: Send + Sync {
    /// Insert one turn. Re-appending an identical `(session, role, content)`
    /// triple is a silent no-op.
    fn append_turn(
        &self,
        session_id: &SessionId,
        role: MessageRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Commit a user turn and its assistant reply together, or neither.
    ///
    /// `assistant_text` is `None` when the endpoint returned no choices; only
    /// the user turn is stored then. Both inserts keep the dedup contract.
    fn append_exchange(
        &self,
        session_id: &SessionId,
        user_text: &str,
        assistant_text: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Up to `limit` earliest-inserted messages, oldest first.
    fn get_history(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, StoreError>> + Send;
}

/// The single global API key record.
pub trait ApiKeyStore: Send + Sync {
    /// Replace the stored key (or create it).
    fn set_api_key(
        &self,
        key: &SecretString,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// The stored key, or `None` when none is configured yet.
    fn get_api_key(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<SecretString>, StoreError>> + Send;
}
