//! Chat engine error types

use thiserror::Error;

/// Errors that can occur in the chat engine
#[derive(Error, Debug)]
pub enum ChatError {
    /// Persistent store failed to read, write or remove a key
    #[error("Store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ChatError {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        ChatError::Other(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        ChatError::Store(msg.into())
    }
}

/// Result type alias for chat engine operations
pub type ChatResult<T> = Result<T, ChatError>;
