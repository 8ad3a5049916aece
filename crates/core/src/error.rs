//! Error types for the catalog Q&A service.
//!
//! This module defines a unified error enum that covers every error category
//! in the application: configuration, I/O, LLM, knowledge, prompt, and the
//! pipeline-specific kinds raised while answering a query.

use thiserror::Error;

/// Fixed user-facing warning returned for blank queries.
pub const EMPTY_QUERY_WARNING: &str = "It seems like you forgot to ask a question.";

/// Unified error type for the catalog Q&A service.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base, chunking and embedding errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// The persisted index is missing or cannot be opened.
    ///
    /// Fatal at startup: the service must not accept queries without it.
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// A search against the index failed during a tool call.
    ///
    /// Recovered locally by the retrieval tool (empty context).
    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    /// Outbound answer notification failed. Logged and swallowed.
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// The query was empty or whitespace only.
    #[error("{}", EMPTY_QUERY_WARNING)]
    EmptyQuery,

    /// Malformed inbound request (e.g. empty session id)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_message_is_the_warning() {
        assert_eq!(AppError::EmptyQuery.to_string(), EMPTY_QUERY_WARNING);
    }

    #[test]
    fn test_json_error_conversion() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
