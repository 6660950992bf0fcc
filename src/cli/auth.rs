//! `auth` command - check that the token works

use crate::cli::style::{Stylize, check};
use anstream::println;
use prland::auth::{get_github_auth, test_github_auth};
use prland::config::load_config;
use prland::error::Result;
use std::path::Path;
use std::process::ExitCode;

/// Resolve the token, call `GET /user` and print the login
pub async fn run_auth(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let auth = get_github_auth().await?;
    let login = test_github_auth(&auth, &config.api_base_url, config.call_timeout()).await?;

    println!(
        "{} Authenticated as {} {}",
        check(),
        login.emphasis(),
        format!("(token from {})", auth.source).muted()
    );
    println!("   API: {}", config.api_base_url.accent());
    Ok(ExitCode::SUCCESS)
}
