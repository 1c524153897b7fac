//! Error types for transport operations.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the channel.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS, or body-transfer failure. Retryable.
    #[error("network error: {0}")]
    Network(String),

    /// The channel throttled the request. Retryable after a pause.
    #[error("rate limited{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// The credentials were rejected. Never retried.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The referenced blob has expired or never existed.
    #[error("not found: {0}")]
    NotFound(String),

    /// The channel answered with an error not covered above.
    #[error("api error {code}: {description}")]
    Api { code: u16, description: String },

    /// The channel answered with something that could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline passed before the operation finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

impl TransportError {
    /// Whether resending the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::RateLimited { .. } => true,
            TransportError::Api { code, .. } => *code >= 500,
            TransportError::Auth(_)
            | TransportError::NotFound(_)
            | TransportError::InvalidResponse(_)
            | TransportError::Cancelled
            | TransportError::DeadlineExceeded => false,
        }
    }

    /// The pause the channel asked for, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TransportError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors embed the request URL, which carries the bot token.
        let err = err.without_url();
        if err.is_decode() {
            TransportError::InvalidResponse(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Convenience type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
