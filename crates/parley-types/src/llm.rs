//! Wire types for the chat-completion endpoint.
//!
//! The request/response shapes follow the OpenAI-style `/chat/completions`
//! contract: `{model, messages, stream}` out, `{choices: [{message}]}` back.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single `{role, content}` entry of the request's message array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Outbound body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// Always `false`; token streaming is not supported.
    pub stream: bool,
}

/// Expected response body. Unknown fields (usage, id, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Some providers send `null` content alongside refusals or tool calls.
    #[serde(default)]
    pub content: Option<String>,
}

/// Result of one completion call.
///
/// A response with zero choices is a success with nothing to say, not an
/// error, and is kept distinct from an answer that happens to be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum CompletionOutcome {
    Answered(String),
    Empty,
}

impl CompletionOutcome {
    /// Map a decoded response to an outcome using the first choice.
    pub fn from_response(response: ChatCompletionResponse) -> Self {
        match response.choices.into_iter().next() {
            Some(choice) => CompletionOutcome::Answered(choice.message.content.unwrap_or_default()),
            None => CompletionOutcome::Empty,
        }
    }

    /// Assistant text, or `""` when the endpoint returned no choices.
    pub fn text(&self) -> &str {
        match self {
            CompletionOutcome::Answered(text) => text,
            CompletionOutcome::Empty => "",
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            CompletionOutcome::Answered(text) => Some(text),
            CompletionOutcome::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let parsed: MessageRole = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
        assert!("tool".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_request_serializes_wire_shape() {
        let request = ChatCompletionRequest {
            model: "deepseek-chat".to_string(),
            messages: vec![
                Message::new(MessageRole::System, "You are a helpful assistant"),
                Message::new(MessageRole::User, "hello"),
            ],
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "deepseek-chat",
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant"},
                    {"role": "user", "content": "hello"}
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn test_outcome_takes_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"message":{"role":"assistant","content":"hi there"}},{"message":{"content":"second"}}],"usage":{}}"#,
        )
        .unwrap();
        let outcome = CompletionOutcome::from_response(response);
        assert_eq!(outcome, CompletionOutcome::Answered("hi there".to_string()));
        assert_eq!(outcome.text(), "hi there");
    }

    #[test]
    fn test_outcome_empty_choices() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let outcome = CompletionOutcome::from_response(response);
        assert_eq!(outcome, CompletionOutcome::Empty);
        assert_eq!(outcome.text(), "");
        assert!(outcome.answer().is_none());

        let missing: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(CompletionOutcome::from_response(missing), CompletionOutcome::Empty);
    }

    #[test]
    fn test_outcome_null_content_is_empty_answer() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(
            CompletionOutcome::from_response(response),
            CompletionOutcome::Answered(String::new())
        );
    }
}
