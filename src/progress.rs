//! Progress reporting for long-running actions

use crate::error::Error;
use async_trait::async_trait;
use std::time::Duration;

/// A remote step of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStep {
    /// Opening the pull request
    CreatePullRequest,
    /// Merging the given pull request
    MergePullRequest(u64),
}

impl std::fmt::Display for ActionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatePullRequest => write!(f, "creating pull request"),
            Self::MergePullRequest(number) => write!(f, "merging pull request #{number}"),
        }
    }
}

/// Observer for executor progress
///
/// Called from the task that performs the remote calls, so implementations
/// must be cheap and must not block.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// A step is about to issue its first call
    async fn on_step_started(&self, step: ActionStep);

    /// A retryable failure happened; the next attempt follows after `delay`
    async fn on_retry(&self, step: ActionStep, attempt: u32, delay: Duration, error: &Error);
}

/// Progress callback that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_step_started(&self, _step: ActionStep) {}

    async fn on_retry(&self, _step: ActionStep, _attempt: u32, _delay: Duration, _error: &Error) {}
}
