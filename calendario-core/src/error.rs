//! Error types for the calendario client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur in calendario operations.
#[derive(Error, Debug)]
pub enum CalendarioError {
    /// The server rejected the session (401 or 403). The session store has
    /// already been cleared when this is returned.
    #[error("Not authenticated (server answered {status})")]
    Unauthenticated { status: StatusCode },

    #[error("Server answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not decode server response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Unknown route '{0}'")]
    UnknownRoute(String),
}

impl CalendarioError {
    /// Whether the server rejected the current credentials.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, CalendarioError::Unauthenticated { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CalendarioError::Unauthenticated { status } | CalendarioError::Status { status, .. } => {
                Some(*status)
            }
            CalendarioError::Http(e) => e.status(),
            _ => None,
        }
    }
}

/// Result type alias for calendario operations.
pub type CalendarioResult<T> = Result<T, CalendarioError>;
