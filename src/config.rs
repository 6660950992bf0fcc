//! Configuration loaded from `<config_dir>/prland/config.toml`.

use crate::error::{Error, Result};
use crate::executor::{DEFAULT_CACHE_CAPACITY, ExecutorSettings, RetryPolicy};
use crate::platform::DEFAULT_API_BASE_URL;
use crate::types::MergeMethod;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Directory name for prland within the platform config dir.
const CONFIG_DIR: &str = "prland";

/// Filename for the config file.
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "GITHUB_API_URL";

/// User configuration
///
/// Every field is optional in the file; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// REST API root
    pub api_base_url: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Success replay window in seconds
    pub dedup_window_secs: u64,
    /// Idempotency cache capacity
    pub cache_capacity: usize,
    /// Strategy for merging
    pub merge_method: MergeMethod,
    /// Retry policy
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 10,
            dedup_window_secs: 600,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            merge_method: MergeMethod::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Per-call timeout
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Executor settings derived from this config
    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            retry: self.retry.clone(),
            call_timeout: self.call_timeout(),
            dedup_window: Duration::from_secs(self.dedup_window_secs),
            cache_capacity: self.cache_capacity,
            merge_method: self.merge_method,
        }
    }

    /// Apply environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            debug!(%url, "API base URL overridden from environment");
            self.api_base_url = url.trim().to_string();
        }
    }

    /// Reject values that cannot work
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api_base_url).map_err(|e| {
            Error::Config(format!("invalid api_base_url '{}': {e}", self.api_base_url))
        })?;
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.factor == 0 {
            return Err(Error::Config("retry.factor must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Default config file location, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the default location is used
/// and a missing file means defaults. Environment overrides are applied last.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_config(&path)?,
            _ => Config::default(),
        },
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<Config> {
    debug!(path = %path.display(), "loading config");
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content).map_err(|e| parse_error(path, &content, &e))
}

/// Location and reason only; the rendered `toml` error quotes the source line
fn parse_error(path: &Path, content: &str, e: &toml::de::Error) -> Error {
    let location = e
        .span()
        .and_then(|span| content.get(..span.start))
        .map(|before| format!(" at line {}", before.matches('\n').count() + 1))
        .unwrap_or_default();
    Error::Config(format!(
        "failed to parse {}{location}: {}",
        path.display(),
        e.message()
    ))
}
