//! Action executor
//!
//! Turns a [`MergeAction`] into remote calls and a single [`ActionOutcome`]:
//! 1. Dedup - replay a recent success or join an in-flight duplicate
//! 2. Create - open the pull request (or reuse one opened earlier for the key)
//! 3. Merge - for [`ActionKind::MergeBranches`], merge it
//!
//! Every remote step runs under the [`RetryPolicy`] with a per-call timeout.
//! Steps run on a spawned task, so a caller that stops waiting does not
//! abort a call already sent.

mod dedup;
mod retry;

pub use dedup::IdempotencyCache;
pub use retry::RetryPolicy;

use crate::action::{
    ActionKind, ActionOutcome, ActionRequest, FailureKind, IdempotencyKey, MergeAction,
};
use crate::error::{Error, Result};
use crate::platform::PullRequestApi;
use crate::progress::{ActionStep, NoopProgress, ProgressCallback};
use crate::types::{MergeMethod, MergeResult, PullRequest};
use dedup::{Claim, SlotGuard, wait_for_outcome};
use retry::run_with_retry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Default bound on one HTTP attempt
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
/// Default lifetime of replayable successes
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(600);
/// Default number of cache slots
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Tunables for [`ActionExecutor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Retry policy applied to each remote step
    pub retry: RetryPolicy,
    /// Bound on a single HTTP attempt
    pub call_timeout: Duration,
    /// How long a success is replayed for identical requests
    pub dedup_window: Duration,
    /// Maximum idempotency cache slots
    pub cache_capacity: usize,
    /// Strategy for the merge step
    pub merge_method: MergeMethod,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            dedup_window: DEFAULT_DEDUP_WINDOW,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            merge_method: MergeMethod::default(),
        }
    }
}

struct Inner {
    api: Arc<dyn PullRequestApi>,
    settings: ExecutorSettings,
    cache: Arc<IdempotencyCache>,
    progress: Arc<dyn ProgressCallback>,
}

/// Resilient, idempotent executor for pull request actions
///
/// Cheap to clone; clones share the API client and the idempotency cache.
#[derive(Clone)]
pub struct ActionExecutor {
    inner: Arc<Inner>,
}

impl ActionExecutor {
    /// Create an executor without progress reporting
    pub fn new(api: Arc<dyn PullRequestApi>, settings: ExecutorSettings) -> Self {
        Self::with_progress(api, settings, Arc::new(NoopProgress))
    }

    /// Create an executor that reports steps and retries to `progress`
    pub fn with_progress(
        api: Arc<dyn PullRequestApi>,
        settings: ExecutorSettings,
        progress: Arc<dyn ProgressCallback>,
    ) -> Self {
        let cache = Arc::new(IdempotencyCache::new(
            settings.dedup_window,
            settings.cache_capacity,
        ));
        Self {
            inner: Arc::new(Inner {
                api,
                settings,
                cache,
                progress,
            }),
        }
    }

    /// Settings in effect
    pub fn settings(&self) -> &ExecutorSettings {
        &self.inner.settings
    }

    /// Open a pull request for `action`
    pub async fn create_pull_request(&self, action: MergeAction) -> ActionOutcome {
        self.execute(ActionKind::CreatePullRequest, action).await
    }

    /// Open a pull request for `action` and merge it
    pub async fn merge_branches(&self, action: MergeAction) -> ActionOutcome {
        self.execute(ActionKind::MergeBranches, action).await
    }

    /// Validate a raw request and run it as `kind`.
    ///
    /// Invalid input yields a validation failure without any network call.
    pub async fn submit(&self, kind: ActionKind, request: &ActionRequest) -> ActionOutcome {
        match MergeAction::try_from(request) {
            Ok(action) => self.execute(kind, action).await,
            Err(e) => {
                debug!(error = %e, "rejected invalid request");
                ActionOutcome::failure(&e)
            }
        }
    }

    async fn execute(&self, kind: ActionKind, action: MergeAction) -> ActionOutcome {
        let key = IdempotencyKey::derive(&action);
        let slot = (kind, key.clone());

        match self.inner.cache.claim(&slot) {
            Claim::Replay(outcome) => {
                info!(%kind, key = key.short(), "replaying earlier success");
                outcome
            }
            Claim::Wait(rx) => {
                debug!(%kind, key = key.short(), "joining in-flight execution");
                wait_for_outcome(rx).await.unwrap_or_else(|| ActionOutcome::Failure {
                    kind: FailureKind::Transient,
                    reason: "identical request in progress was abandoned".to_string(),
                })
            }
            Claim::Lead(tx) => {
                let guard = SlotGuard::new(Arc::clone(&self.inner.cache), slot, tx);
                let inner = Arc::clone(&self.inner);
                let task = tokio::spawn(async move {
                    let outcome = inner.run(kind, &action, &key).await;
                    guard.complete(&outcome);
                    outcome
                });
                match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(%kind, error = %e, "action task failed");
                        ActionOutcome::failure(&Error::Internal(format!("action task failed: {e}")))
                    }
                }
            }
        }
    }
}

impl Inner {
    async fn run(&self, kind: ActionKind, action: &MergeAction, key: &IdempotencyKey) -> ActionOutcome {
        info!(
            %kind,
            repo = %action.repository(),
            head = action.source_branch(),
            base = action.target_branch(),
            key = key.short(),
            "executing action"
        );

        let pr = match self.obtain_pull_request(action, key).await {
            Ok(pr) => pr,
            Err(e) => {
                info!(%kind, error = %e, "pull request creation failed");
                return ActionOutcome::failure(&e);
            }
        };

        if kind == ActionKind::CreatePullRequest {
            info!(pr_number = pr.number, url = %pr.html_url, "pull request ready");
            return ActionOutcome::Success {
                pull_request_url: pr.html_url,
                pull_request_number: pr.number,
            };
        }

        match self.merge(action, pr.number).await {
            Ok(result) if result.merged => {
                self.cache.forget_created(key);
                info!(pr_number = pr.number, sha = ?result.sha, "pull request merged");
                ActionOutcome::Success {
                    pull_request_url: pr.html_url,
                    pull_request_number: pr.number,
                }
            }
            Ok(result) => {
                let reason = result
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "GitHub did not merge the pull request".to_string());
                info!(pr_number = pr.number, %reason, "merge declined");
                ActionOutcome::PartialSuccess {
                    pull_request_url: pr.html_url,
                    pull_request_number: pr.number,
                    reason,
                    retryable: false,
                }
            }
            Err(e) => {
                info!(pr_number = pr.number, error = %e, "merge failed after creating pull request");
                ActionOutcome::PartialSuccess {
                    pull_request_url: pr.html_url,
                    pull_request_number: pr.number,
                    reason: e.to_string(),
                    retryable: e.is_retryable(),
                }
            }
        }
    }

    /// Reuse the pull request remembered for `key`, or open one.
    ///
    /// Runs under the per-key create lock, so a create and a merge of the
    /// same fields never both open a pull request.
    async fn obtain_pull_request(
        &self,
        action: &MergeAction,
        key: &IdempotencyKey,
    ) -> Result<PullRequest> {
        let lock = self.cache.create_lock(key);
        let result = {
            let _creating = lock.lock().await;
            if let Some(pr) = self.cache.created_pull_request(key) {
                info!(pr_number = pr.number, "reusing pull request opened earlier");
                Ok(pr)
            } else {
                let created = self.create(action).await;
                if let Ok(pr) = &created {
                    self.cache.remember_created(key, pr);
                }
                created
            }
        };
        self.cache.release_create_lock(key, lock);
        result
    }

    async fn create(&self, action: &MergeAction) -> Result<PullRequest> {
        let step = ActionStep::CreatePullRequest;
        let payload = action.to_new_pull_request();
        let repo = action.repository();

        self.progress.on_step_started(step).await;
        run_with_retry(
            &self.settings.retry,
            self.settings.call_timeout,
            step,
            self.progress.as_ref(),
            || self.api.create_pull_request(repo, &payload),
        )
        .await
    }

    async fn merge(&self, action: &MergeAction, pr_number: u64) -> Result<MergeResult> {
        let step = ActionStep::MergePullRequest(pr_number);
        let request = action.to_merge_request(self.settings.merge_method);
        let repo = action.repository();

        self.progress.on_step_started(step).await;
        run_with_retry(
            &self.settings.retry,
            self.settings.call_timeout,
            step,
            self.progress.as_ref(),
            || self.api.merge_pull_request(repo, pr_number, &request),
        )
        .await
    }
}
