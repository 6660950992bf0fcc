//! CLI commands

pub mod action;
pub mod auth;
pub mod context;
pub mod style;

pub use action::{ActionArgs, OutputOptions, run_action};
pub use auth::run_auth;

use async_trait::async_trait;
use indicatif::ProgressBar;
use prland::error::Error;
use prland::progress::{ActionStep, ProgressCallback};
use std::time::Duration;
use style::{Stylize, spinner_style};

/// Progress reporter driving a spinner
pub struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    /// Spinner on stderr, hidden when `quiet` (JSON output)
    pub fn spinner(quiet: bool) -> Self {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        };
        Self { spinner }
    }

    /// Clear the spinner before printing the result
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_step_started(&self, step: ActionStep) {
        let message = match step {
            ActionStep::CreatePullRequest => "Creating pull request...".to_string(),
            ActionStep::MergePullRequest(number) => format!("Merging pull request #{number}..."),
        };
        self.spinner.set_message(message);
    }

    async fn on_retry(&self, step: ActionStep, attempt: u32, delay: Duration, error: &Error) {
        self.spinner.set_message(format!(
            "{step} (attempt {} failed: {}; retrying in {:.1}s)",
            attempt,
            error.muted(),
            delay.as_secs_f64()
        ));
    }
}
