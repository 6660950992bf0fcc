//! Error types for prland

use std::time::Duration;
use thiserror::Error;

/// Result alias using the crate error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by configuration, authentication and the GitHub API layer
///
/// The executor never lets these escape; it folds them into an
/// [`ActionOutcome`](crate::action::ActionOutcome).
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation before any network call
    #[error("invalid input: {0}")]
    Validation(String),

    /// The remote API answered with a non-success status
    #[error("GitHub API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
        /// Delay requested by the server via `Retry-After`
        retry_after: Option<Duration>,
    },

    /// Connection-level failure (DNS, TLS, reset, malformed body)
    #[error("network error: {0}")]
    Transport(String),

    /// A single call exceeded its time budget
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Missing or unusable credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether repeating the same call may succeed.
    ///
    /// 429 and 5xx responses, transport failures and timeouts are retryable.
    /// Every other 4xx is a terminal client error.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Validation(_)
            | Self::Auth(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => false,
        }
    }

    /// Server-requested delay before the next attempt, if any
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status for API errors
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
