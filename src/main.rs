//! prland CLI - create and merge GitHub pull requests

mod cli;

use anstream::eprintln;
use anyhow::Context;
use clap::{Parser, Subcommand};
use cli::style::{CROSS, Stylize};
use cli::{ActionArgs, OutputOptions};
use prland::action::ActionKind;
use prland::types::MergeMethod;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "PRLAND_LOG";

#[derive(Parser)]
#[command(name = "prland")]
#[command(about = "Create and merge GitHub pull requests with retries and duplicate suppression")]
#[command(version)]
struct Cli {
    /// Path to config file (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log remote calls and retries to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a pull request
    Create {
        #[command(flatten)]
        action: ActionArgs,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a pull request and merge it
    Merge {
        #[command(flatten)]
        action: ActionArgs,

        /// Merge strategy: merge, squash or rebase
        #[arg(long, value_name = "METHOD")]
        method: Option<MergeMethod>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Print the outcome as JSON (implies --yes)
        #[arg(long)]
        json: bool,
    },

    /// Check GitHub authentication
    Auth,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("prland=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", CROSS.error(), format!("{e:#}").error());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.config.as_deref();

    let code = match cli.command {
        Commands::Create { action, json } => cli::run_action(
            ActionKind::CreatePullRequest,
            &action,
            None,
            config,
            OutputOptions { json, yes: true },
        )
        .await
        .context("create failed")?,
        Commands::Merge {
            action,
            method,
            yes,
            json,
        } => cli::run_action(
            ActionKind::MergeBranches,
            &action,
            method,
            config,
            OutputOptions { json, yes },
        )
        .await
        .context("merge failed")?,
        Commands::Auth => cli::run_auth(config)
            .await
            .context("authentication check failed")?,
    };

    Ok(code)
}
