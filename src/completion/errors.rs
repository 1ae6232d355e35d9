//! Completion gateway error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility — these types carry the context needed to
//! build meaningful log entries.

use thiserror::Error;

/// Errors that can occur while talking to the completion provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// TCP/HTTP connection to the provider endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The provider did not respond within the configured timeout.
    #[error("completion timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response from the provider.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The provider answered 2xx but the body carried no usable text.
    #[error("empty completion: {reason}")]
    EmptyCompletion { reason: String },

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    Config { reason: String },
}

impl CompletionError {
    /// Whether a failure is worth one attempt against the backup model.
    ///
    /// 429 covers provider rate limiting; 5xx covers transient server-side
    /// failures. 4xx other than 429 (bad key, bad request) would fail the
    /// same way on the backup model.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            CompletionError::ConnectionFailed { .. }
                | CompletionError::Timeout { .. }
                | CompletionError::Http { status: 429, .. }
                | CompletionError::Http {
                    status: 500..=504,
                    ..
                }
        )
    }
}
