//! Bounded retries with exponential backoff

use crate::error::{Error, Result};
use crate::progress::{ActionStep, ProgressCallback};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for a single remote step
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts per step, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    #[serde(rename = "base_delay_ms", with = "millis")]
    pub base_delay: Duration,
    /// Multiplier applied per further failure
    pub factor: u32,
    /// Upper bound on any single delay
    #[serde(rename = "max_delay_ms", with = "millis")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            factor: 2,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Policy that gives up after the first failure
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Effective attempt budget (never zero)
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff after failed attempt number `attempt` (1-based).
    ///
    /// `base * factor^(attempt - 1)`, capped at `max_delay`. Non-decreasing
    /// in `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = self.factor.max(1).saturating_pow(exponent);
        self.base_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// Delay before the next attempt.
    ///
    /// Honours a server `Retry-After` and never drops below `previous`, so
    /// the delays of one step stay non-decreasing. Capped at `max_delay`.
    pub fn next_delay(&self, attempt: u32, error: &Error, previous: Duration) -> Duration {
        let computed = self.delay_for(attempt).max(previous);
        error
            .retry_after()
            .map_or(computed, |requested| computed.max(requested))
            .min(self.max_delay)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Run `call` until it succeeds, fails terminally, or the budget runs out.
///
/// Each attempt is bounded by `call_timeout`; running out of time counts as a
/// retryable failure. The last error is returned when attempts are exhausted.
pub(crate) async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    call_timeout: Duration,
    step: ActionStep,
    progress: &dyn ProgressCallback,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;
    let mut delay = Duration::ZERO;

    loop {
        let result = match tokio::time::timeout(call_timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(call_timeout)),
        };

        match result {
            Ok(value) => {
                debug!(%step, attempt, "step succeeded");
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                delay = policy.next_delay(attempt, &e, delay);
                warn!(
                    %step,
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "retryable failure, backing off"
                );
                progress.on_retry(step, attempt, delay, &e).await;
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!(%step, attempts = attempt, error = %e, "giving up after retries");
                } else {
                    debug!(%step, attempt, error = %e, "terminal failure");
                }
                return Err(e);
            }
        }
    }
}
