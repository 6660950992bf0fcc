//! prland - create and merge GitHub pull requests reliably
//!
//! The library exposes an [`ActionExecutor`](executor::ActionExecutor) that
//! turns "open a pull request from A into B" (optionally "and merge it") into
//! GitHub REST calls with:
//!
//! - bounded retries with exponential backoff for 429/5xx/timeouts
//! - a per-call timeout
//! - duplicate suppression keyed on the logical action
//! - a typed [`ActionOutcome`](action::ActionOutcome) that distinguishes
//!   success, partial success (opened but not merged) and failure
//!
//! The GitHub client sits behind the [`PullRequestApi`](platform::PullRequestApi)
//! trait so it can be replaced in tests.

pub mod action;
pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod platform;
pub mod progress;
pub mod types;

pub use action::{ActionKind, ActionOutcome, ActionRequest, ActionResponse, MergeAction};
pub use error::{Error, Result};
pub use executor::{ActionExecutor, ExecutorSettings, RetryPolicy};
