//! Shared test utilities

#![allow(dead_code)]

pub mod mock_api;

pub use mock_api::{MockPullRequestApi, api_error, make_pr, merged};

use prland::action::MergeAction;
use prland::types::Repository;

/// Valid action against `acme/widgets`
pub fn widgets_action(title: &str) -> MergeAction {
    MergeAction::new(
        Repository::parse("acme/widgets").unwrap(),
        "feature-x",
        "main",
        title,
        Some("Adds feature X"),
    )
    .unwrap()
}
