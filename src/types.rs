//! Core types for prland

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

/// Characters GitHub accepts in owner and repository names
static NAME_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex is valid")
});

/// A GitHub repository identified as `owner/name`
///
/// (De)serializes as the `owner/name` string and goes through the same
/// validation as [`Repository::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Repository {
    owner: String,
    name: String,
}

impl Repository {
    /// Build a repository from its two segments
    pub fn new(owner: &str, name: &str) -> Result<Self> {
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() {
            return Err(Error::Validation(
                "repository owner must not be empty".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(Error::Validation(
                "repository name must not be empty".to_string(),
            ));
        }
        for segment in [owner, name] {
            if !NAME_SEGMENT.is_match(segment) {
                return Err(Error::Validation(format!(
                    "invalid characters in repository segment '{segment}'"
                )));
            }
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Parse an `owner/name` string
    pub fn parse(s: &str) -> Result<Self> {
        let Some((owner, name)) = s.trim().split_once('/') else {
            return Err(Error::Validation(format!(
                "invalid repository '{s}', use \"owner/repo\""
            )));
        };
        if name.contains('/') {
            return Err(Error::Validation(format!(
                "invalid repository '{s}', use \"owner/repo\""
            )));
        }
        Self::new(owner, name)
    }

    /// Repository owner (user or organization)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Repository {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Repository> for String {
    fn from(repo: Repository) -> Self {
        repo.to_string()
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A pull request as returned by the create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
}

/// Payload for opening a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    /// PR title
    pub title: String,
    /// PR body (empty when no description was given)
    pub body: String,
    /// Branch holding the changes
    pub head: String,
    /// Branch the changes go into
    pub base: String,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Create a merge commit
    #[default]
    Merge,
    /// Squash all commits into one
    Squash,
    /// Rebase commits onto base branch
    Rebase,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Squash => write!(f, "squash"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

impl FromStr for MergeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "squash" => Ok(Self::Squash),
            "rebase" => Ok(Self::Rebase),
            other => Err(Error::Validation(format!(
                "unknown merge method '{other}' (expected merge, squash or rebase)"
            ))),
        }
    }
}

/// Payload for merging a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeRequest {
    /// Title of the merge commit
    pub commit_title: String,
    /// Message of the merge commit
    pub commit_message: String,
    /// Merge strategy
    pub merge_method: MergeMethod,
}

/// Result of a merge operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    #[serde(default)]
    pub sha: Option<String>,
    /// Message from the merge operation
    #[serde(default)]
    pub message: Option<String>,
}
