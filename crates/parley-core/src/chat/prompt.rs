//! Prompt assembly.
//!
//! The request's message array is always `[system] + history + [user]`.

use parley_types::chat::ChatMessage;
use parley_types::llm::{Message, MessageRole};

/// Build the ordered message list for a completion request.
///
/// The system prompt is synthesized here and never read from storage.
pub fn build_messages(system_prompt: &str, history: &[ChatMessage], user_text: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::new(MessageRole::System, system_prompt));
    messages.extend(
        history
            .iter()
            .map(|turn| Message::new(turn.role, turn.content.clone())),
    );
    messages.push(Message::new(MessageRole::User, user_text));
    messages
}
