//! Captcha command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::Settings;
use crate::context;
use crate::output;

#[derive(Args, Debug)]
pub struct CaptchaArgs {
    /// Address to send the verification code to
    pub email: String,
}

pub async fn run(settings: &Settings, args: CaptchaArgs) -> Result<()> {
    let session = context::open_session(settings)?;

    session
        .request_captcha(&args.email)
        .await
        .context("Failed to request verification code")?;

    output::success(&format!("Verification code sent to {}", args.email));

    Ok(())
}
