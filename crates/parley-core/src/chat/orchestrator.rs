//! Completion orchestration for a single chat turn.
//!
//! One call walks `KeyLookup -> HistoryFetch -> PromptAssembly ->
//! RequestDispatch -> ResponseParse -> Persisted | Failed`. There is no
//! retry: a failed call leaves storage untouched and the caller decides
//! whether to resend. Resending is safe because exchange writes dedup on
//! identical content.
//!
//! Calls for the same session are serialized from history fetch through
//! persistence so two concurrent turns never build on the same snapshot.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

use parley_types::chat::{ChatReply, SessionId};
use parley_types::config::ParleyConfig;
use parley_types::error::ChatError;
use parley_types::llm::ChatCompletionRequest;

use crate::chat::prompt::build_messages;
use crate::chat::repository::{ApiKeyStore, HistoryStore};
use crate::llm::client::CompletionClient;

/// Request-shaping settings, usually taken from [`ParleyConfig`].
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub model: String,
    pub system_prompt: String,
    pub history_limit: u32,
}

impl From<&ParleyConfig> for OrchestratorSettings {
    fn from(config: &ParleyConfig) -> Self {
        Self {
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            history_limit: config.history_limit,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&ParleyConfig::default())
    }
}

/// Runs chat turns against a completion backend and records them.
///
/// Generic over the history store, key store and completion client so
/// parley-core never depends on parley-infra.
pub struct ChatOrchestrator<H: HistoryStore, K: ApiKeyStore, C: CompletionClient> {
    history: H,
    keys: K,
    client: C,
    settings: OrchestratorSettings,
    session_locks: DashMap<SessionId, Arc<Mutex<()>>>,
}

impl<H: HistoryStore, K: ApiKeyStore, C: CompletionClient> ChatOrchestrator<H, K, C> {
    pub fn new(history: H, keys: K, client: C, settings: OrchestratorSettings) -> Self {
        Self {
            history,
            keys,
            client,
            settings,
            session_locks: DashMap::new(),
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// Run one chat turn and return the assistant's reply.
    ///
    /// A failure to persist the exchange does not fail the call; it is
    /// reported through [`ChatReply::persistence_warning`].
    #[tracing::instrument(name = "send_message", skip(self, session_id, user_text), fields(session_id = %session_id))]
    pub async fn send_message(
        &self,
        session_id: &SessionId,
        user_text: &str,
    ) -> Result<ChatReply, ChatError> {
        let slot = self.session_slot(session_id);
        let _turn = slot.mutex.lock().await;
        self.run_turn(session_id, user_text).await
    }

    /// Like [`send_message`](Self::send_message), aborting when `cancel` fires.
    ///
    /// Cancellation drops the in-flight request or store operation; an
    /// uncommitted exchange transaction is rolled back, never half-applied.
    pub async fn send_message_with_cancel(
        &self,
        session_id: &SessionId,
        user_text: &str,
        cancel: CancellationToken,
    ) -> Result<ChatReply, ChatError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(session_id = %session_id, "chat turn cancelled");
                Err(ChatError::Cancelled)
            }
            result = self.send_message(session_id, user_text) => result,
        }
    }

    async fn run_turn(&self, session_id: &SessionId, user_text: &str) -> Result<ChatReply, ChatError> {
        debug!(state = "key_lookup");
        let api_key = self
            .keys
            .get_api_key()
            .await?
            .ok_or(ChatError::MissingApiKey)?;

        debug!(state = "history_fetch", limit = self.settings.history_limit);
        let history = self
            .history
            .get_history(session_id, self.settings.history_limit)
            .await?;

        debug!(state = "prompt_assembly", history_len = history.len());
        let request = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: build_messages(&self.settings.system_prompt, &history, user_text),
            stream: false,
        };

        debug!(state = "request_dispatch");
        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.client.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.message_count = request.messages.len(),
            gen_ai.response.outcome = tracing::field::Empty,
        );
        let outcome = match self
            .client
            .complete(&api_key, &request)
            .instrument(span.clone())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(state = "failed", error = %e, "completion request failed");
                return Err(e);
            }
        };

        let outcome_kind = if outcome.answer().is_some() { "answered" } else { "empty" };
        span.record("gen_ai.response.outcome", outcome_kind);
        debug!(state = "response_parse", outcome = outcome_kind);
        if outcome.answer().is_none() {
            warn!("completion returned no choices; storing the user turn only");
        }

        let persistence_warning = match self
            .history
            .append_exchange(session_id, user_text, outcome.answer())
            .await
        {
            Ok(()) => {
                debug!(state = "persisted");
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to persist exchange; returning answer anyway");
                Some(e.to_string())
            }
        };

        Ok(ChatReply {
            outcome,
            persistence_warning,
        })
    }

    fn session_slot<'a>(&'a self, session_id: &'a SessionId) -> SessionSlot<'a> {
        let mutex = self
            .session_locks
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        SessionSlot {
            locks: &self.session_locks,
            session_id,
            mutex,
        }
    }
}

/// A caller's claim on a session lock.
///
/// Dropping it, on completion or when the turn future is cancelled, removes
/// the map entry once no other caller holds or waits on the same lock.
struct SessionSlot<'a> {
    locks: &'a DashMap<SessionId, Arc<Mutex<()>>>,
    session_id: &'a SessionId,
    mutex: Arc<Mutex<()>>,
}

impl Drop for SessionSlot<'_> {
    fn drop(&mut self) {
        // Two references left: the map entry and this slot.
        self.locks.remove_if(self.session_id, |_, lock| {
            Arc::ptr_eq(lock, &self.mutex) && Arc::strong_count(lock) == 2
        });
    }
}
