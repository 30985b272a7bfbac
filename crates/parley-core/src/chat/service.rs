//! Chat service: the narrow set of operations callers use.
//!
//! ChatService bundles the session directory with the orchestrator (which
//! owns the history and key stores) and is what the CLI and REST bridge
//! hold. Every operation returns a typed `Result`; none of them exit.

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::info;

use parley_types::chat::{ChatMessage, ChatReply, Session, SessionId};
use parley_types::error::{ChatError, StoreError};

use crate::chat::orchestrator::ChatOrchestrator;
use crate::chat::repository::{ApiKeyStore, HistoryStore, SessionDirectory};
use crate::llm::client::CompletionClient;

/// Caller-facing facade over sessions, history, keys and completions.
pub struct ChatService<D, H, K, C>
where
    D: SessionDirectory,
    H: HistoryStore,
    K: ApiKeyStore,
    C: CompletionClient,
{
    directory: D,
    orchestrator: ChatOrchestrator<H, K, C>,
    display_history_limit: u32,
}

impl<D, H, K, C> ChatService<D, H, K, C>
where
    D: SessionDirectory,
    H: HistoryStore,
    K: ApiKeyStore,
    C: CompletionClient,
{
    pub fn new(directory: D, orchestrator: ChatOrchestrator<H, K, C>, display_history_limit: u32) -> Self {
        Self {
            directory,
            orchestrator,
            display_history_limit,
        }
    }

    // --- Sessions ---

    pub async fn create_session(&self) -> Result<SessionId, StoreError> {
        let id = self.directory.create_session().await?;
        info!(session_id = %id, "Session created");
        Ok(id)
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        self.directory.list_sessions().await
    }

    /// Sessions in creation order, each with its stored title.
    pub async fn list_sessions_with_titles(&self) -> Result<Vec<Session>, StoreError> {
        let ids = self.directory.list_sessions().await?;
        let mut sessions = Vec::with_capacity(ids.len());
        for id in ids {
            let title = self.directory.get_title(&id).await?;
            sessions.push(Session { id, title });
        }
        Ok(sessions)
    }

    /// Stored title; `None` means none recorded yet (render a default).
    pub async fn get_title(&self, session_id: &SessionId) -> Result<Option<String>, StoreError> {
        self.directory.get_title(session_id).await
    }

    // --- Conversation ---

    pub async fn send_message(&self, session_id: &SessionId, text: &str) -> Result<ChatReply, ChatError> {
        self.orchestrator.send_message(session_id, text).await
    }

    pub async fn send_message_with_cancel(
        &self,
        session_id: &SessionId,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<ChatReply, ChatError> {
        self.orchestrator
            .send_message_with_cancel(session_id, text, cancel)
            .await
    }

    /// Stored turns for display, oldest first, capped at the display limit.
    pub async fn get_history(&self, session_id: &SessionId) -> Result<Vec<ChatMessage>, StoreError> {
        self.get_history_limited(session_id, self.display_history_limit)
            .await
    }

    pub async fn get_history_limited(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        self.orchestrator.history().get_history(session_id, limit).await
    }

    // --- API key ---

    pub async fn set_api_key(&self, key: SecretString) -> Result<(), StoreError> {
        self.orchestrator.keys().set_api_key(&key).await?;
        info!("API key updated");
        Ok(())
    }

    pub async fn get_api_key(&self) -> Result<Option<SecretString>, StoreError> {
        self.orchestrator.keys().get_api_key().await
    }
}
