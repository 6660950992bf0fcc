//! Mock pull request API for testing

#![allow(dead_code)]

use async_trait::async_trait;
use prland::error::{Error, Result};
use prland::platform::PullRequestApi;
use prland::types::{MergeMethod, MergeRequest, MergeResult, NewPullRequest, PullRequest, Repository};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Call record for `create_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCall {
    pub repository: String,
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
    pub at: Instant,
}

/// Call record for `merge_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCall {
    pub repository: String,
    pub pr_number: u64,
    pub method: MergeMethod,
    pub at: Instant,
}

struct Scripted<T> {
    delay: Duration,
    result: Result<T>,
}

/// Hand-written mock for `PullRequestApi`
///
/// Features:
/// - Scripted responses per operation, consumed in order
/// - Defaults once the script runs out: create succeeds with an
///   auto-incrementing PR number, merge succeeds
/// - Optional latency for every call
/// - Call tracking with (tokio) timestamps
pub struct MockPullRequestApi {
    next_pr_number: AtomicU64,
    latency: Mutex<Duration>,
    create_script: Mutex<VecDeque<Scripted<PullRequest>>>,
    merge_script: Mutex<VecDeque<Scripted<MergeResult>>>,
    create_calls: Mutex<Vec<CreateCall>>,
    merge_calls: Mutex<Vec<MergeCall>>,
}

impl Default for MockPullRequestApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPullRequestApi {
    pub fn new() -> Self {
        Self {
            next_pr_number: AtomicU64::new(1),
            latency: Mutex::new(Duration::ZERO),
            create_script: Mutex::new(VecDeque::new()),
            merge_script: Mutex::new(VecDeque::new()),
            create_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
        }
    }

    // === Scripting ===

    /// Delay applied to every unscripted response
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Queue a create response
    pub fn push_create(&self, result: Result<PullRequest>) {
        self.push_create_after(Duration::ZERO, result);
    }

    /// Queue a create response delivered after `delay`
    pub fn push_create_after(&self, delay: Duration, result: Result<PullRequest>) {
        self.create_script
            .lock()
            .unwrap()
            .push_back(Scripted { delay, result });
    }

    /// Queue a merge response
    pub fn push_merge(&self, result: Result<MergeResult>) {
        self.merge_script.lock().unwrap().push_back(Scripted {
            delay: Duration::ZERO,
            result,
        });
    }

    // === Call inspection ===

    pub fn create_calls(&self) -> Vec<CreateCall> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn merge_calls(&self) -> Vec<MergeCall> {
        self.merge_calls.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.lock().unwrap().len()
    }

    pub fn merge_count(&self) -> usize {
        self.merge_calls.lock().unwrap().len()
    }

    /// Gaps between consecutive create calls
    pub fn create_gaps(&self) -> Vec<Duration> {
        let calls = self.create_calls();
        calls.windows(2).map(|w| w[1].at - w[0].at).collect()
    }

    fn default_latency(&self) -> Duration {
        *self.latency.lock().unwrap()
    }
}

#[async_trait]
impl PullRequestApi for MockPullRequestApi {
    async fn create_pull_request(
        &self,
        repo: &Repository,
        pr: &NewPullRequest,
    ) -> Result<PullRequest> {
        self.create_calls.lock().unwrap().push(CreateCall {
            repository: repo.to_string(),
            head: pr.head.clone(),
            base: pr.base.clone(),
            title: pr.title.clone(),
            body: pr.body.clone(),
            at: Instant::now(),
        });

        let scripted = self.create_script.lock().unwrap().pop_front();
        let (delay, result) = match scripted {
            Some(s) => (s.delay, s.result),
            None => {
                let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
                (self.default_latency(), Ok(make_pr(repo, number)))
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn merge_pull_request(
        &self,
        repo: &Repository,
        pr_number: u64,
        request: &MergeRequest,
    ) -> Result<MergeResult> {
        self.merge_calls.lock().unwrap().push(MergeCall {
            repository: repo.to_string(),
            pr_number,
            method: request.merge_method,
            at: Instant::now(),
        });

        let scripted = self.merge_script.lock().unwrap().pop_front();
        let (delay, result) = match scripted {
            Some(s) => (s.delay, s.result),
            None => (self.default_latency(), Ok(merged())),
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

// === Builders ===

/// PR as GitHub would return it for `repo`
pub fn make_pr(repo: &Repository, number: u64) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("https://github.com/{repo}/pull/{number}"),
    }
}

/// Successful merge result
pub fn merged() -> MergeResult {
    MergeResult {
        merged: true,
        sha: Some("6dcb09b5b57875f334f61aebed695e2e4193db5e".to_string()),
        message: Some("Pull Request successfully merged".to_string()),
    }
}

/// Error as the GitHub client reports a non-2xx status
pub fn api_error(status: u16, message: &str) -> Error {
    Error::Api {
        status,
        message: message.to_string(),
        retry_after: None,
    }
}
