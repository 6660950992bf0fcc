//! Platform services for GitHub
//!
//! Provides the two remote operations the executor drives.

mod github;

pub use github::{DEFAULT_API_BASE_URL, GitHubService};

use crate::error::Result;
use crate::types::{MergeRequest, MergeResult, NewPullRequest, PullRequest, Repository};
use async_trait::async_trait;

/// Remote pull request operations
///
/// One call per method invocation, no retries: retrying and classification
/// belong to the executor. Implementors report non-2xx answers as
/// [`Error::Api`](crate::error::Error::Api) so the status survives.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// Open a pull request from `pr.head` into `pr.base`
    async fn create_pull_request(
        &self,
        repo: &Repository,
        pr: &NewPullRequest,
    ) -> Result<PullRequest>;

    /// Merge an open pull request
    async fn merge_pull_request(
        &self,
        repo: &Repository,
        pr_number: u64,
        request: &MergeRequest,
    ) -> Result<MergeResult>;
}
