//! Error types for Answerbook

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the answer memory
#[derive(Error, Debug)]
pub enum AnswerError {
    /// A store that must exist before startup is missing
    #[error("Required answer store not found: {}", path.display())]
    MissingStore { path: PathBuf },

    /// Writing a store back to disk failed
    #[error("Failed to persist answer store {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Answer does not fit the category it is stored under
    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Nobody answered within the configured wait
    #[error("Timed out after {waited:?} waiting for an answer to \"{question}\"")]
    OperatorTimeout { question: String, waited: Duration },

    /// Resolution was cancelled before an answer arrived
    #[error("Cancelled while waiting for an answer to \"{question}\"")]
    Cancelled { question: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AnswerError>;
