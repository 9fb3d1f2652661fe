//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tokenward_core::{LoginCredentials, PersistencePolicy};

use crate::cli::Settings;
use crate::context;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long, env = "TOKENWARD_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Keep the credential after the login session ends
    #[arg(long)]
    pub remember: bool,
}

pub async fn run(settings: &Settings, args: LoginArgs) -> Result<()> {
    let session = context::open_session(settings)?;
    let credentials = LoginCredentials::new(&args.username, &args.password);
    let policy = PersistencePolicy::from_remember(args.remember);

    output::note("Logging in...");

    let snapshot = session
        .login(&credentials, policy)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    let username = snapshot
        .user
        .as_ref()
        .and_then(|user| user.username())
        .unwrap_or(args.username.as_str());
    output::field("User", username);
    output::field("Stored", &policy.to_string());

    Ok(())
}
