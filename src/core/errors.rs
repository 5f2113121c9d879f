//! Custom error types for translation operations

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Root directory missing or unreadable
    #[error("Discovery error: {path} - {message}")]
    DiscoveryError {
        /// Offending path
        path: String,
        /// Detail
        message: String,
    },

    /// Translation service rejected the request
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Detail
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitError,

    /// Generic service failure (used by non-HTTP services)
    #[error("Translation service error: {message}")]
    ServiceError {
        /// Detail
        message: String,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        /// Detail
        message: String,
    },

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        /// Detail
        message: String,
    },

    /// File operation error
    #[error("File error: {path} - {message}")]
    FileError {
        /// Offending path
        path: String,
        /// Detail
        message: String,
    },

    /// Language name or code not recognised
    #[error("Unknown language: {name}")]
    UnknownLanguage {
        /// Input as given
        name: String,
    },

    /// Batch cancelled before the work was dispatched
    #[error("Translation cancelled")]
    Cancelled,

    /// Wrapper for anyhow errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TranslationError {
    pub(crate) fn file(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        TranslationError::FileError {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for TranslationError {
    fn from(err: anyhow::Error) -> Self {
        TranslationError::InternalError(err.to_string())
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
