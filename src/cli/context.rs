//! Shared command context for CLI commands

use prland::auth::get_github_auth;
use prland::config::{Config, load_config};
use prland::error::Result;
use prland::executor::{ActionExecutor, ExecutorSettings};
use prland::platform::{GitHubService, PullRequestApi};
use prland::progress::ProgressCallback;
use prland::types::MergeMethod;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Setup shared by `create` and `merge`:
/// - load configuration
/// - resolve the GitHub token
/// - build the API client
pub struct CommandContext {
    /// Effective configuration
    pub config: Config,
    api: Arc<dyn PullRequestApi>,
}

impl CommandContext {
    /// Create a new command context
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)?;
        let auth = get_github_auth().await?;
        debug!(source = %auth.source, api = %config.api_base_url, "resolved credentials");

        let service = GitHubService::new(auth.token, &config.api_base_url, config.call_timeout())?;

        Ok(Self {
            config,
            api: Arc::new(service),
        })
    }

    /// Build an executor reporting to `progress`.
    ///
    /// `merge_method` overrides the configured strategy.
    pub fn executor(
        &self,
        progress: Arc<dyn ProgressCallback>,
        merge_method: Option<MergeMethod>,
    ) -> ActionExecutor {
        let mut settings: ExecutorSettings = self.config.executor_settings();
        if let Some(method) = merge_method {
            settings.merge_method = method;
        }
        ActionExecutor::with_progress(Arc::clone(&self.api), settings, progress)
    }
}
