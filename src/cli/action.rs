//! `create` and `merge` commands

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{CROSS, Stylize, WARN, check};
use anstream::println;
use clap::Args;
use dialoguer::Confirm;
use prland::action::{ActionKind, ActionOutcome, ActionRequest, ActionResponse, MergeAction};
use prland::error::{Error, Result};
use prland::types::MergeMethod;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use supports_hyperlinks::Stream;
use terminal_link::Link;

/// Fields describing the pull request
#[derive(Debug, Clone, Args)]
pub struct ActionArgs {
    /// Repository as `owner/name`
    pub repository: String,

    /// Branch with the changes
    #[arg(long, value_name = "BRANCH")]
    pub head: String,

    /// Branch to merge into
    #[arg(long, value_name = "BRANCH")]
    pub base: String,

    /// Pull request title
    #[arg(long)]
    pub title: String,

    /// Pull request description
    #[arg(long)]
    pub body: Option<String>,
}

impl ActionArgs {
    fn to_request(&self) -> ActionRequest {
        ActionRequest {
            repository: self.repository.clone(),
            source_branch: self.head.clone(),
            target_branch: self.base.clone(),
            title: self.title.clone(),
            description: self.body.clone(),
        }
    }
}

/// How the command talks to the user
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Print the outcome as JSON; implies no prompt and no spinner
    pub json: bool,
    /// Skip the merge confirmation
    pub yes: bool,
}

/// Run `create` or `merge`
pub async fn run_action(
    kind: ActionKind,
    args: &ActionArgs,
    merge_method: Option<MergeMethod>,
    config_path: Option<&Path>,
    output: OutputOptions,
) -> Result<ExitCode> {
    // Reject bad input before touching config, credentials or the network
    let action = match MergeAction::try_from(&args.to_request()) {
        Ok(action) => action,
        Err(e) => return report(&ActionOutcome::failure(&e), kind, output),
    };

    let ctx = CommandContext::new(config_path).await?;

    if kind == ActionKind::MergeBranches && !output.json && !output.yes {
        print_plan(&action, merge_method.unwrap_or(ctx.config.merge_method));
        if !Confirm::new()
            .with_prompt("Proceed with merge?")
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            println!("{}", "Aborted".muted());
            return Ok(ExitCode::SUCCESS);
        }
        println!();
    }

    let progress = Arc::new(CliProgress::spinner(output.json));
    let executor = ctx.executor(progress.clone(), merge_method);
    let outcome = match kind {
        ActionKind::CreatePullRequest => executor.create_pull_request(action).await,
        ActionKind::MergeBranches => executor.merge_branches(action).await,
    };
    progress.finish();

    report(&outcome, kind, output)
}

fn print_plan(action: &MergeAction, method: MergeMethod) {
    println!("{}:", "Merge plan".emphasis());
    println!("  Repository: {}", action.repository().accent());
    println!(
        "  Branches:   {} → {}",
        action.source_branch().accent(),
        action.target_branch().accent()
    );
    println!("  Title:      {}", action.title());
    println!("  Method:     {}", method.to_string().muted());
    println!();
}

fn report(outcome: &ActionOutcome, kind: ActionKind, output: OutputOptions) -> Result<ExitCode> {
    if output.json {
        let response = ActionResponse::from(outcome);
        let json = serde_json::to_string_pretty(&response)
            .map_err(|e| Error::Internal(format!("Failed to serialize response: {e}")))?;
        println!("{json}");
    } else {
        print_outcome(outcome, kind);
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_outcome(outcome: &ActionOutcome, kind: ActionKind) {
    match outcome {
        ActionOutcome::Success {
            pull_request_url,
            pull_request_number,
        } => {
            let verb = match kind {
                ActionKind::CreatePullRequest => "Opened",
                ActionKind::MergeBranches => "Merged",
            };
            println!(
                "{} {verb} pull request #{pull_request_number}",
                check()
            );
            println!("   {}", hyperlink(pull_request_url));
        }
        ActionOutcome::PartialSuccess {
            pull_request_url,
            pull_request_number,
            reason,
            retryable,
        } => {
            println!(
                "{} Opened pull request #{pull_request_number} but could not merge it",
                WARN.warn()
            );
            println!("   {}", hyperlink(pull_request_url));
            println!("   {}", reason.muted());
            if *retryable {
                println!("   {}", "GitHub may accept the merge if retried later.".muted());
            }
        }
        ActionOutcome::Failure { kind, reason } => {
            println!("{} {} ({kind})", CROSS.error(), reason.error());
        }
    }
}

fn hyperlink(url: &str) -> String {
    if supports_hyperlinks::on(Stream::Stdout) {
        Link::new(url, url).to_string()
    } else {
        url.accent()
    }
}
