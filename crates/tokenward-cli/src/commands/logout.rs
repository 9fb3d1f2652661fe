//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::Settings;
use crate::context;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(settings: &Settings, _args: LogoutArgs) -> Result<()> {
    let session = context::open_session(settings)?;

    if !session.is_authenticated() {
        output::success("Already logged out");
        return Ok(());
    }

    session.logout().await;
    output::success("Logged out");

    Ok(())
}
