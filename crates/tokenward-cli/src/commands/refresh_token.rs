//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::Settings;
use crate::context;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(settings: &Settings, _args: RefreshTokenArgs) -> Result<()> {
    let session = context::require_session(settings)?;

    output::note("Refreshing access token...");

    session
        .refresh()
        .await
        .context("Failed to refresh session")?;

    output::success("Access token refreshed");

    Ok(())
}
