//! Error types shared across the workspace.

use thiserror::Error;

/// Result type alias used by every repository and service.
pub type Result<T> = std::result::Result<T, Error>;

/// Retry policy class for remote-store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteRetryClass {
    Retryable,
    Permanent,
}

/// Failures raised by the local cache engine.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Internal(String),
}

/// Failures raised by the remote document store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Error response from the document API.
    #[error("Remote API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connect, timeout, body).
    #[error("Remote transport error: {0}")]
    Transport(String),

    /// The store is reachable but refused the request shape.
    #[error("Invalid remote request: {0}")]
    InvalidRequest(String),
}

impl RemoteError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Classify the failure for outbox retry scheduling.
    pub fn retry_class(&self) -> RemoteRetryClass {
        match self {
            Self::Api { status, .. } => match *status {
                408 | 409 | 423 | 425 | 429 => RemoteRetryClass::Retryable,
                500..=599 => RemoteRetryClass::Retryable,
                _ => RemoteRetryClass::Permanent,
            },
            Self::Transport(_) => RemoteRetryClass::Retryable,
            Self::InvalidRequest(_) => RemoteRetryClass::Permanent,
        }
    }
}

/// Top-level error for the data platform.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Remote retry class when this error originated at the remote store.
    pub fn remote_retry_class(&self) -> Option<RemoteRetryClass> {
        match self {
            Self::Remote(err) => Some(err.retry_class()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let err = RemoteError::api(503, "unavailable");
        assert_eq!(err.retry_class(), RemoteRetryClass::Retryable);
    }

    #[test]
    fn client_errors_are_permanent() {
        let err = RemoteError::api(404, "not found");
        assert_eq!(err.retry_class(), RemoteRetryClass::Permanent);
    }

    #[test]
    fn transport_errors_are_retryable() {
        let err = RemoteError::transport("connection refused");
        assert_eq!(err.retry_class(), RemoteRetryClass::Retryable);
    }
}
