//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::Settings;
use crate::context;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Load the profile from the server instead of the stored copy
    #[arg(long)]
    pub fetch: bool,

    /// Print the full profile as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(settings: &Settings, args: WhoamiArgs) -> Result<()> {
    let session = context::require_session(settings)?;

    let profile = if args.fetch {
        Some(
            session
                .fetch_profile()
                .await
                .context("Failed to fetch profile")?,
        )
    } else {
        session.current_user()
    };

    if args.json {
        return output::json_pretty(&profile);
    }

    output::field("Status", &session.status().to_string());
    if let Some(policy) = session.persistence() {
        output::field("Stored", &policy.to_string());
    }
    match profile {
        Some(profile) => {
            output::field("Username", profile.username().unwrap_or("-"));
            output::field("Email", profile.email().unwrap_or("-"));
        }
        None => output::field("Profile", "not loaded (use --fetch)"),
    }

    Ok(())
}
