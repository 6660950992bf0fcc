//! GitHub token resolution

use super::{AuthSource, GitHubToken};
use crate::error::{Error, Result};
use crate::platform::GitHubService;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Resolved GitHub credentials
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Bearer token
    pub token: GitHubToken,
    /// Where the token came from
    pub source: AuthSource,
}

/// Resolve a GitHub token.
///
/// Checks `GITHUB_TOKEN`, then `GH_TOKEN`, then falls back to
/// `gh auth token`.
pub async fn get_github_auth() -> Result<GitHubAuthConfig> {
    for var in TOKEN_ENV_VARS {
        if let Some(token) = std::env::var(var).ok().and_then(GitHubToken::new) {
            debug!(var, "using GitHub token from environment");
            return Ok(GitHubAuthConfig {
                token,
                source: AuthSource::EnvVar,
            });
        }
    }

    debug!("no token in environment, asking gh CLI");
    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .map_err(|e| {
            Error::Auth(format!(
                "no GITHUB_TOKEN or GH_TOKEN set and gh CLI unavailable: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(Error::Auth(
            "no GITHUB_TOKEN or GH_TOKEN set and `gh auth token` failed; run `gh auth login`"
                .to_string(),
        ));
    }

    let token = GitHubToken::new(String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| Error::Auth("gh CLI returned an empty token".to_string()))?;

    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
    })
}

/// Verify credentials against the API, returning the authenticated login
pub async fn test_github_auth(
    config: &GitHubAuthConfig,
    api_base_url: &str,
    timeout: Duration,
) -> Result<String> {
    let service = GitHubService::new(config.token.clone(), api_base_url, timeout)?;
    service.current_user().await
}
