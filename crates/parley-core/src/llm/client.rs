//! CompletionClient trait definition.
//!
//! The one network boundary of the system: a single non-streaming POST to
//! a chat-completion endpoint. Uses native async fn in traits (RPITIT).

use secrecy::SecretString;

use parley_types::error::ChatError;
use parley_types::llm::{ChatCompletionRequest, CompletionOutcome};

/// Backend that turns an ordered message list into an assistant reply.
///
/// Implementations live in parley-infra (e.g., `HttpCompletionClient`).
/// Errors must be classified: non-2xx and undecodable bodies are
/// `Upstream`/`MalformedResponse`, an elapsed deadline is `Timeout`.
pub trait CompletionClient: Send + Sync {
    /// Human-readable backend name, used in tracing spans.
    fn name(&self) -> &str;

    /// Send one completion request authenticated with `api_key`.
    fn complete(
        &self,
        api_key: &SecretString,
        request: &ChatCompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionOutcome, ChatError>> + Send;
}
