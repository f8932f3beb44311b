//! Error types for PromptAssist
//!
//! This module defines the error hierarchy for all operations in the service.

use thiserror::Error;

/// Main error type for PromptAssist
#[derive(Error, Debug)]
pub enum PromptAssistError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Language model errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Cache backend errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Metrics registry errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Request validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Prompt exceeds maximum length of {max} characters")]
    PromptTooLong { max: usize },

    #[error("Prompt must be at least {min} characters")]
    PromptTooShort { min: usize },

    #[error("{message}")]
    InvalidRequest { message: String },
}

/// Language model errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM optimization is currently disabled")]
    Disabled,

    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("Empty completion returned by model")]
    EmptyCompletion,

    #[error("Malformed model response: {message}")]
    MalformedResponse { message: String },
}

/// Cache backend errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },
}

/// Result type alias for PromptAssist operations
pub type Result<T> = std::result::Result<T, PromptAssistError>;

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend {
            message: err.to_string(),
        }
    }
}

impl From<redis::RedisError> for PromptAssistError {
    fn from(err: redis::RedisError) -> Self {
        PromptAssistError::Cache(CacheError::from(err))
    }
}

impl From<validator::ValidationErrors> for PromptAssistError {
    fn from(errors: validator::ValidationErrors) -> Self {
        PromptAssistError::Validation(ValidationError::InvalidRequest {
            message: errors.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::PromptTooLong { max: 5000 };
        assert_eq!(
            err.to_string(),
            "Prompt exceeds maximum length of 5000 characters"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: PromptAssistError = LlmError::Disabled.into();
        assert!(matches!(err, PromptAssistError::Llm(LlmError::Disabled)));
    }
}
