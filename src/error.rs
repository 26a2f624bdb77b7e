use thiserror::Error;

/// Main error type for Kintree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KintreeError {
    /// Entity identifier absent from the knowledge base
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Network or HTTP failure, including non-success status codes
    #[error("Transport error: {0}")]
    Transport(String),

    /// Operation superseded or aborted before completion
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for KintreeError {
    fn from(e: reqwest::Error) -> Self {
        KintreeError::Transport(e.to_string())
    }
}

/// Convenient Result type using KintreeError
pub type Result<T> = std::result::Result<T, KintreeError>;
