//! Action model
//!
//! A [`MergeAction`] is the validated, immutable description of what the
//! caller wants done. Raw input arrives as an [`ActionRequest`] and is
//! converted before anything touches the network.

mod key;
mod outcome;

pub use key::IdempotencyKey;
pub use outcome::{ActionOutcome, ActionResponse, FailureKind};

use crate::error::{Error, Result};
use crate::types::{MergeMethod, MergeRequest, NewPullRequest, Repository};
use serde::{Deserialize, Serialize};

/// Which remote operation a request maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Open a pull request only
    CreatePullRequest,
    /// Open a pull request and merge it
    MergeBranches,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatePullRequest => write!(f, "create pull request"),
            Self::MergeBranches => write!(f, "merge branches"),
        }
    }
}

/// Raw inbound request, as submitted by a form or RPC handler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    /// `owner/repo`
    pub repository: String,
    /// Branch holding the changes
    pub source_branch: String,
    /// Branch to merge into
    pub target_branch: String,
    /// Pull request title
    pub title: String,
    /// Pull request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A validated branch merge / pull request action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeAction {
    repository: Repository,
    source_branch: String,
    target_branch: String,
    title: String,
    description: Option<String>,
}

impl MergeAction {
    /// Build an action, rejecting empty fields and identical branches
    pub fn new(
        repository: Repository,
        source_branch: &str,
        target_branch: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Self> {
        let source_branch = required("source branch", source_branch)?;
        let target_branch = required("target branch", target_branch)?;
        let title = required("title", title)?;

        if source_branch == target_branch {
            return Err(Error::Validation(format!(
                "source and target branch are both '{source_branch}'"
            )));
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(ToString::to_string);

        Ok(Self {
            repository,
            source_branch,
            target_branch,
            title,
            description,
        })
    }

    /// Target repository
    pub const fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Branch holding the changes
    pub fn source_branch(&self) -> &str {
        &self.source_branch
    }

    /// Branch to merge into
    pub fn target_branch(&self) -> &str {
        &self.target_branch
    }

    /// Pull request title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Pull request body, if any
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Payload for the create call
    pub fn to_new_pull_request(&self) -> NewPullRequest {
        NewPullRequest {
            title: self.title.clone(),
            body: self.description.clone().unwrap_or_default(),
            head: self.source_branch.clone(),
            base: self.target_branch.clone(),
        }
    }

    /// Payload for the merge call; the PR title and body become the commit
    pub fn to_merge_request(&self, method: MergeMethod) -> MergeRequest {
        MergeRequest {
            commit_title: self.title.clone(),
            commit_message: self.description.clone().unwrap_or_default(),
            merge_method: method,
        }
    }
}

impl TryFrom<&ActionRequest> for MergeAction {
    type Error = Error;

    fn try_from(request: &ActionRequest) -> Result<Self> {
        let repository = Repository::parse(&request.repository)?;
        Self::new(
            repository,
            &request.source_branch,
            &request.target_branch,
            &request.title,
            request.description.as_deref(),
        )
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}
