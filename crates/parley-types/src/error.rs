use thiserror::Error;

/// Errors from the persistence store (open, migrate, query).
///
/// `Clone` so a cached initialization outcome can be handed to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("failed to create schema: {0}")]
    Migrate(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("database is closed")]
    Closed,
}

/// Errors from a chat orchestration call.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no API key configured")]
    MissingApiKey,

    #[error("completion endpoint returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("completion request timed out")]
    Timeout,

    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("request cancelled")]
    Cancelled,
}

/// Error classification exposed to callers in result envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Store,
    Config,
    Upstream,
    Timeout,
    Cancelled,
}

impl ErrorClass {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorClass::Store => "STORE_ERROR",
            ErrorClass::Config => "CONFIG_ERROR",
            ErrorClass::Upstream => "UPSTREAM_ERROR",
            ErrorClass::Timeout => "TIMEOUT_ERROR",
            ErrorClass::Cancelled => "CANCELLED",
        }
    }
}

impl ChatError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ChatError::Store(_) => ErrorClass::Store,
            ChatError::MissingApiKey => ErrorClass::Config,
            ChatError::Upstream { .. }
            | ChatError::MalformedResponse(_)
            | ChatError::Transport(_) => ErrorClass::Upstream,
            ChatError::Timeout => ErrorClass::Timeout,
            ChatError::Cancelled => ErrorClass::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_upstream_error_carries_status_and_body() {
        let err = ChatError::Upstream {
            status: 500,
            body: "server error".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("server error"));
        assert_eq!(err.class().code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(ChatError::MissingApiKey.class(), ErrorClass::Config);
        assert_eq!(ChatError::Timeout.class(), ErrorClass::Timeout);
        assert_eq!(ChatError::Transport("dns".into()).class(), ErrorClass::Upstream);
        assert_eq!(ChatError::MalformedResponse("eof".into()).class(), ErrorClass::Upstream);
        assert_eq!(ChatError::from(StoreError::Closed).class(), ErrorClass::Store);
        assert_eq!(ErrorClass::Cancelled.code(), "CANCELLED");
    }
}
