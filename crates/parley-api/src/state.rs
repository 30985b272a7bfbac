//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! `ChatService` is generic over its store and client traits; AppState pins
//! it to the SQLite stores and the HTTP completion client.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::chat::orchestrator::{ChatOrchestrator, OrchestratorSettings};
use parley_core::chat::service::ChatService;
use parley_infra::config::{database_url, load_config, resolve_data_dir};
use parley_infra::llm::http::HttpCompletionClient;
use parley_infra::sqlite::api_key::SqliteApiKeyStore;
use parley_infra::sqlite::history::SqliteHistoryStore;
use parley_infra::sqlite::pool::Store;
use parley_infra::sqlite::session::SqliteSessionDirectory;
use parley_types::config::ParleyConfig;
use tokio_util::sync::CancellationToken;

/// Concrete type alias for the chat service pinned to infra implementations.
pub type ConcreteChatService = ChatService<
    SqliteSessionDirectory,
    SqliteHistoryStore,
    SqliteApiKeyStore,
    HttpCompletionClient,
>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub store: Arc<Store>,
    pub config: Arc<ParleyConfig>,
    pub data_dir: PathBuf,
    /// Fired on server shutdown; aborts in-flight chat turns.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Initialize from the resolved data directory and its `config.toml`.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        Self::build(data_dir, config).await
    }

    /// Open the database under `data_dir` and wire services with `config`.
    pub async fn build(data_dir: PathBuf, config: ParleyConfig) -> anyhow::Result<Self> {
        let store = Store::new(database_url(&data_dir));
        let pool = store.initialize().await?;

        let orchestrator = ChatOrchestrator::new(
            SqliteHistoryStore::new(pool.clone()),
            SqliteApiKeyStore::new(pool.clone()),
            HttpCompletionClient::from_config(&config)?,
            OrchestratorSettings::from(&config),
        );
        let chat_service = ChatService::new(
            SqliteSessionDirectory::new(pool),
            orchestrator,
            config.display_history_limit,
        );

        Ok(Self {
            chat_service: Arc::new(chat_service),
            store: Arc::new(store),
            config: Arc::new(config),
            data_dir,
            shutdown: CancellationToken::new(),
        })
    }

    /// Cancel in-flight turns and release the database pools.
    pub async fn close(&self) -> anyhow::Result<()> {
        self.shutdown.cancel();
        self.store.close().await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use parley_types::chat::{MessageRole, SessionId};
    use parley_types::error::{ChatError, ErrorClass};
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// State over a fresh temp database, pointed at `base_url`.
    pub(crate) async fn test_state(base_url: &str) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ParleyConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
            ..ParleyConfig::default()
        };
        let state = AppState::build(dir.path().to_path_buf(), config).await.unwrap();
        (state, dir)
    }

    #[tokio::test]
    async fn test_end_to_end_first_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (state, _dir) = test_state(&server.uri()).await;
        let svc = &state.chat_service;
        svc.set_api_key(SecretString::from("sk-test")).await.unwrap();

        let id = svc.create_session().await.unwrap();
        assert_eq!(id, SessionId::from("Session0"));

        let reply = svc.send_message(&id, "hello").await.unwrap();
        assert_eq!(reply.text(), "hi there");
        assert!(reply.persistence_warning.is_none());

        let history = svc.get_history(&id).await.unwrap();
        let turns: Vec<(MessageRole, &str)> =
            history.iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(
            turns,
            vec![(MessageRole::User, "hello"), (MessageRole::Assistant, "hi there")]
        );
        assert_eq!(svc.get_title(&id).await.unwrap(), Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_missing_key_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (state, _dir) = test_state(&server.uri()).await;
        let svc = &state.chat_service;
        let id = svc.create_session().await.unwrap();

        let err = svc.send_message(&id, "hello").await.unwrap_err();
        assert!(matches!(err, ChatError::MissingApiKey));
        assert_eq!(err.class(), ErrorClass::Config);
        assert_eq!(err.class().code(), "CONFIG_ERROR");
        assert!(svc.get_history(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_error_adds_no_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .mount(&server)
            .await;

        let (state, _dir) = test_state(&server.uri()).await;
        let svc = &state.chat_service;
        svc.set_api_key(SecretString::from("sk-test")).await.unwrap();
        let id = svc.create_session().await.unwrap();

        let err = svc.send_message(&id, "hello").await.unwrap_err();
        match &err {
            ChatError::Upstream { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body, "server error");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
        assert_eq!(err.class().code(), "UPSTREAM_ERROR");
        assert!(svc.get_history(&id).await.unwrap().is_empty());
        assert_eq!(svc.get_title(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_history_is_sent_on_next_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "noted"}}]
            })))
            .mount(&server)
            .await;

        let (state, _dir) = test_state(&server.uri()).await;
        let svc = &state.chat_service;
        svc.set_api_key(SecretString::from("sk-test")).await.unwrap();
        let id = svc.create_session().await.unwrap();

        svc.send_message(&id, "my name is Ada").await.unwrap();
        svc.send_message(&id, "what is my name?").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        let contents: Vec<&str> = messages
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(
            contents,
            vec![
                "You are a helpful assistant",
                "my name is Ada",
                "noted",
                "what is my name?"
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_during_slow_completion_leaves_no_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": [{"message": {"content": "too late"}}]}))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let (state, _dir) = test_state(&server.uri()).await;
        let svc = &state.chat_service;
        svc.set_api_key(SecretString::from("sk-test")).await.unwrap();
        let id = svc.create_session().await.unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let err = svc
            .send_message_with_cancel(&id, "hello", cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Cancelled));
        assert_eq!(err.class().code(), "CANCELLED");
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
        assert!(svc.get_history(&id).await.unwrap().is_empty());
        assert_eq!(svc.get_title(&id).await.unwrap(), None);

        // The session is usable again once the cancelled turn is gone.
        server.reset().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "hi"}}]
            })))
            .mount(&server)
            .await;
        let reply = svc.send_message(&id, "hello").await.unwrap();
        assert_eq!(reply.text(), "hi");
        assert_eq!(svc.get_history(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_state_reopens_existing_data() {
        let dir = tempfile::tempdir().unwrap();
        let first = AppState::build(dir.path().to_path_buf(), ParleyConfig::default())
            .await
            .unwrap();
        first.chat_service.create_session().await.unwrap();
        first.close().await.unwrap();

        let second = AppState::build(dir.path().to_path_buf(), ParleyConfig::default())
            .await
            .unwrap();
        let sessions = second.chat_service.list_sessions().await.unwrap();
        assert_eq!(sessions, vec![SessionId::from("Session0")]);
    }
}
