//! Configuration types for Parley.
//!
//! `ParleyConfig` represents the optional `config.toml` in the data
//! directory. Every field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParleyConfig {
    /// Model identifier sent in every completion request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the completion API; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Deadline for a single completion request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of stored turns stitched into each prompt.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Number of turns returned when a caller views a session's history.
    #[serde(default = "default_display_history_limit")]
    pub display_history_limit: u32,

    /// System prompt synthesized at the head of every request (never stored).
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_history_limit() -> u32 {
    10
}

fn default_display_history_limit() -> u32 {
    100
}

fn default_system_prompt() -> String {
    "You are a helpful assistant".to_string()
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            history_limit: default_history_limit(),
            display_history_limit: default_display_history_limit(),
            system_prompt: default_system_prompt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = ParleyConfig::default();
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.display_history_limit, 100);
        assert_eq!(config.system_prompt, "You are a helpful assistant");
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: ParleyConfig = toml::from_str("").unwrap();
        assert_eq!(config, ParleyConfig::default());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: ParleyConfig = toml::from_str(
            r#"
model = "gpt-4o-mini"
base_url = "https://api.openai.com/v1"
history_limit = 4
"#,
        )
        .unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.history_limit, 4);
        assert_eq!(config.request_timeout_secs, 30);
    }
}
