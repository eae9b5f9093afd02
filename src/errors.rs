/*!
 * Error types for the batchtrans library.
 *
 * Backend failures are described by `BackendError`. The orchestrator treats
 * every variant as transient and retries it; only the two fatal kinds in
 * `TranslationError` ever escape a translation run.
 */

use std::fmt::Display;

use thiserror::Error;

/// Errors reported by a translation backend for a single call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The request could not be sent or did not complete
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The response payload could not be understood
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the service itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The service rejected the call because of rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Credentials were missing or rejected
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Anything else the backend wants to report
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Wrap an arbitrary displayable error
    pub fn other(error: impl Display) -> Self {
        Self::Other(error.to_string())
    }
}

impl From<anyhow::Error> for BackendError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(format!("{:#}", error))
    }
}

/// Fatal errors that terminate a translation run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// One batch kept failing after the configured number of retries
    #[error("{message}")]
    RetriesExhausted {
        /// Number of attempts made for the failing batch
        attempts: u32,
        /// Localized, host-facing message
        message: String,
        /// Detail of the last backend failure
        last_error: Option<String>,
    },

    /// Fewer than half of all lines received a translation
    #[error("{message}")]
    AggregateFailure {
        /// Lines that received a translated value
        translated: usize,
        /// Lines in the input
        total: usize,
        /// Localized, host-facing message
        message: String,
        /// Detail of the last backend failure, if any
        last_error: Option<String>,
    },
}

impl TranslationError {
    /// Detail of the backend failure that led to this error
    pub fn last_error(&self) -> Option<&str> {
        match self {
            Self::RetriesExhausted { last_error, .. } | Self::AggregateFailure { last_error, .. } => {
                last_error.as_deref()
            }
        }
    }
}
