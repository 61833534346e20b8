//! Error types used throughout the client

use thiserror::Error;

/// Main error type for Davenport operations
#[derive(Error, Debug)]
pub enum DavenportError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connect, TLS or read failure below the HTTP layer. Always propagated.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status on a call that did not opt into silent mode.
    #[error("{method} {path} returned {status} {reason}: {body}")]
    UnexpectedStatus {
        method: String,
        path: String,
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The server answered 2xx but the body does not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DavenportError {
    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a structured HTTP failure for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<serde_json::Error> for DavenportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Davenport operations
pub type Result<T> = std::result::Result<T, DavenportError>;
