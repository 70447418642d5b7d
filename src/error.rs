//! Error types for mailroom.

use thiserror::Error;

/// Errors produced by the mailroom library.
#[derive(Debug, Error)]
pub enum MailroomError {
    /// Device storage could not be opened, read, or written.
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid configuration or arguments.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON could not be encoded or decoded.
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request never produced a response (connect, timeout, body read).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("Backend rejected request ({status}): {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// A persisted operation carries a type tag this build does not know.
    #[error("Unrecognized operation type: {0}")]
    UnknownOperation(String),

    /// A persisted operation payload does not match its type.
    #[error("Invalid {operation} payload: {message}")]
    InvalidPayload {
        /// Operation type tag.
        operation: String,
        /// Decoder message.
        message: String,
    },

    /// Requested item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl MailroomError {
    /// Whether this error means the backend was never reached.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for MailroomError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Backend {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => Self::Network(err.to_string()),
        }
    }
}
