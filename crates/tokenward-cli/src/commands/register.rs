//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tokenward_core::Registration;

use crate::cli::Settings;
use crate::context;
use crate::output;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Username for the new account
    #[arg(long)]
    pub username: String,

    /// Email address for the new account
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,

    /// Password confirmation; defaults to --password
    #[arg(long)]
    pub password_confirm: Option<String>,

    /// Verification code sent by `tokenward captcha`
    #[arg(long)]
    pub captcha: Option<String>,
}

pub async fn run(settings: &Settings, args: RegisterArgs) -> Result<()> {
    let confirm = args
        .password_confirm
        .unwrap_or_else(|| args.password.clone());
    let mut registration = Registration::new(&args.username, &args.email, &args.password, confirm)
        .context("Invalid registration")?;
    if let Some(code) = args.captcha {
        registration = registration.with_captcha(code);
    }

    let session = context::open_session(settings)?;
    let response = session
        .register(&registration)
        .await
        .context("Failed to register")?;

    output::success(&format!("Registered {}", args.username));
    if !response.is_null() {
        output::json_pretty(&response)?;
    }

    Ok(())
}
