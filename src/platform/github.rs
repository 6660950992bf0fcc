//! GitHub platform service implementation

use crate::auth::GitHubToken;
use crate::error::{Error, Result};
use crate::platform::PullRequestApi;
use crate::types::{MergeRequest, MergeResult, NewPullRequest, PullRequest, Repository};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use chrono::Utc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Public GitHub REST endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("prland/", env!("CARGO_PKG_VERSION"));

/// Error body GitHub sends with non-2xx responses
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct AuthenticatedUser {
    login: String,
}

/// GitHub service over raw REST calls
///
/// Holds one `reqwest::Client` for its whole lifetime; construct it once and
/// share it behind an `Arc`.
pub struct GitHubService {
    http_client: Client,
    token: GitHubToken,
    /// API root without trailing slash, e.g. `https://api.github.com`
    api_base: String,
    timeout: Duration,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// `api_base_url` is `https://api.github.com` or, for GitHub Enterprise,
    /// `https://<host>/api/v3`.
    pub fn new(token: GitHubToken, api_base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(api_base_url)
            .map_err(|e| Error::Config(format!("invalid API base URL '{api_base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API base URL must be http(s), got '{api_base_url}'"
            )));
        }

        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            token,
            api_base: parsed.as_str().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn pulls_url(&self, repo: &Repository) -> String {
        self.api_url(&format!(
            "/repos/{}/{}/pulls",
            urlencoding::encode(repo.owner()),
            urlencoding::encode(repo.name())
        ))
    }

    /// Login of the token's owner (`GET /user`)
    pub async fn current_user(&self) -> Result<String> {
        let user: AuthenticatedUser = self
            .send(self.http_client.get(self.api_url("/user")))
            .await?;
        Ok(user.login)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(self.token.expose())
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        // A 2xx with a body we cannot read means the call may have taken
        // effect; report it as terminal so it is never repeated.
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Internal(format!("unexpected response body: {e}")))
    }

    fn transport_error(&self, e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Transport(e.to_string())
        }
    }
}

/// Convert a non-2xx response into `Error::Api`
async fn api_error(response: Response) -> Error {
    let mut status = response.status();
    let headers = response.headers().clone();
    let mut retry_after = parse_retry_after(&headers);

    // Primary rate limit exhaustion arrives as 403 with zero remaining
    if status == StatusCode::FORBIDDEN && rate_limit_exhausted(&headers) {
        status = StatusCode::TOO_MANY_REQUESTS;
        retry_after = retry_after.or_else(|| rate_limit_reset_delay(&headers));
    }

    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    });

    debug!(status = status.as_u16(), %message, "GitHub API returned an error");
    Error::Api {
        status: status.as_u16(),
        message,
        retry_after,
    }
}

/// Pull `message` (and the first detailed error) out of a GitHub error body
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = parsed.message?;

    let detail = parsed.errors.first().and_then(|e| match e {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("code"))
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string),
        _ => None,
    });

    Some(match detail {
        Some(detail) => format!("{message}: {detail}"),
        None => message,
    })
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

/// Time until `x-ratelimit-reset` (epoch seconds); zero if already past
fn rate_limit_reset_delay(headers: &HeaderMap) -> Option<Duration> {
    let reset = headers
        .get("x-ratelimit-reset")?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;
    let remaining = reset.saturating_sub(Utc::now().timestamp());
    Some(Duration::from_secs(u64::try_from(remaining).unwrap_or(0)))
}

#[async_trait]
impl PullRequestApi for GitHubService {
    async fn create_pull_request(
        &self,
        repo: &Repository,
        pr: &NewPullRequest,
    ) -> Result<PullRequest> {
        debug!(%repo, head = %pr.head, base = %pr.base, "creating PR");
        let created: PullRequest = self
            .send(self.http_client.post(self.pulls_url(repo)).json(pr))
            .await?;
        debug!(%repo, pr_number = created.number, "created PR");
        Ok(created)
    }

    async fn merge_pull_request(
        &self,
        repo: &Repository,
        pr_number: u64,
        request: &MergeRequest,
    ) -> Result<MergeResult> {
        debug!(%repo, pr_number, method = %request.merge_method, "merging PR");
        let url = format!("{}/{pr_number}/merge", self.pulls_url(repo));
        let result: MergeResult = self.send(self.http_client.put(url).json(request)).await?;
        debug!(
            %repo,
            pr_number,
            merged = result.merged,
            sha = ?result.sha,
            "merge complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_with_detail() {
        let body = r#"{"message":"Validation Failed","errors":[{"resource":"PullRequest","code":"custom","message":"A pull request already exists for acme:feature-x."}]}"#;
        assert_eq!(
            error_message(body).unwrap(),
            "Validation Failed: A pull request already exists for acme:feature-x."
        );
    }

    #[test]
    fn test_error_message_falls_back_to_code() {
        let body = r#"{"message":"Validation Failed","errors":[{"resource":"PullRequest","field":"head","code":"invalid"}]}"#;
        assert_eq!(error_message(body).unwrap(), "Validation Failed: invalid");
    }

    #[test]
    fn test_error_message_plain() {
        assert_eq!(
            error_message(r#"{"message":"Not Found"}"#).unwrap(),
            "Not Found"
        );
        assert!(error_message("<html>bad gateway</html>").is_none());
    }

    #[test]
    fn test_rate_limit_reset_delay() {
        let mut headers = HeaderMap::new();
        let reset = Utc::now().timestamp() + 30;
        headers.insert("x-ratelimit-reset", reset.to_string().parse().unwrap());
        let delay = rate_limit_reset_delay(&headers).unwrap();
        assert!(delay <= Duration::from_secs(30) && delay >= Duration::from_secs(28));

        headers.insert("x-ratelimit-reset", "1".parse().unwrap());
        assert_eq!(rate_limit_reset_delay(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let token = GitHubToken::new("t").unwrap();
        assert!(matches!(
            GitHubService::new(token.clone(), "ftp://example.com", Duration::from_secs(1)),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            GitHubService::new(token, "not a url", Duration::from_secs(1)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_enterprise_base_url_keeps_path() {
        let token = GitHubToken::new("t").unwrap();
        let service =
            GitHubService::new(token, "https://ghe.example.com/api/v3/", Duration::from_secs(1))
                .unwrap();
        let repo = Repository::parse("acme/widgets").unwrap();
        assert_eq!(
            service.pulls_url(&repo),
            "https://ghe.example.com/api/v3/repos/acme/widgets/pulls"
        );
    }
}
