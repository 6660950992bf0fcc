//! Action outcomes and the caller-facing response shape

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Why an action failed outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Malformed input, rejected before any network call
    Validation,
    /// The remote API rejected the request
    Client,
    /// Timeout, 5xx, 429 or transport failure that outlasted the retries
    Transient,
}

impl FailureKind {
    /// Classify an error from the API layer
    pub fn of(error: &Error) -> Self {
        match error {
            Error::Validation(_) => Self::Validation,
            e if e.is_retryable() => Self::Transient,
            _ => Self::Client,
        }
    }

    /// Only transient failures are worth trying again
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "invalid request"),
            Self::Client => write!(f, "rejected by GitHub"),
            Self::Transient => write!(f, "GitHub unavailable"),
        }
    }
}

/// Final result of one executor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Every step completed
    Success {
        /// Web URL of the pull request
        pull_request_url: String,
        /// PR number
        pull_request_number: u64,
    },
    /// The pull request exists but merging it failed
    PartialSuccess {
        /// Web URL of the created pull request
        pull_request_url: String,
        /// PR number
        pull_request_number: u64,
        /// Why the merge step failed
        reason: String,
        /// Whether the merge failure was transient
        retryable: bool,
    },
    /// Nothing externally visible happened (or it could not be confirmed)
    Failure {
        /// Failure classification
        kind: FailureKind,
        /// Human-readable reason
        reason: String,
    },
}

impl ActionOutcome {
    /// Failure outcome for an error
    pub fn failure(error: &Error) -> Self {
        Self::Failure {
            kind: FailureKind::of(error),
            reason: error.to_string(),
        }
    }

    /// True only for full success
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether submitting the same action again may help
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Success { .. } => false,
            Self::PartialSuccess { retryable, .. } => *retryable,
            Self::Failure { kind, .. } => kind.is_retryable(),
        }
    }

    /// URL of the pull request, when one exists
    pub fn pull_request_url(&self) -> Option<&str> {
        match self {
            Self::Success {
                pull_request_url, ..
            }
            | Self::PartialSuccess {
                pull_request_url, ..
            } => Some(pull_request_url),
            Self::Failure { .. } => None,
        }
    }

    /// Failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::PartialSuccess { reason, .. } | Self::Failure { reason, .. } => Some(reason),
        }
    }
}

/// Response returned to callers: `{success, pullRequestUrl?, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    /// Whether the whole action succeeded
    pub success: bool,
    /// PR URL (also present on partial success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_url: Option<String>,
    /// Error message for anything short of full success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ActionOutcome> for ActionResponse {
    fn from(outcome: &ActionOutcome) -> Self {
        match outcome {
            ActionOutcome::Success {
                pull_request_url, ..
            } => Self {
                success: true,
                pull_request_url: Some(pull_request_url.clone()),
                error: None,
            },
            ActionOutcome::PartialSuccess {
                pull_request_url,
                pull_request_number,
                reason,
                ..
            } => Self {
                success: false,
                pull_request_url: Some(pull_request_url.clone()),
                error: Some(format!(
                    "Pull request #{pull_request_number} was created but not merged: {reason}"
                )),
            },
            ActionOutcome::Failure { reason, .. } => Self {
                success: false,
                pull_request_url: None,
                error: Some(reason.clone()),
            },
        }
    }
}

impl From<ActionOutcome> for ActionResponse {
    fn from(outcome: ActionOutcome) -> Self {
        Self::from(&outcome)
    }
}
