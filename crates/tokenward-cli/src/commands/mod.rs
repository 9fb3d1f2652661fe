//! Subcommand implementations.

mod captcha;
mod login;
mod logout;
mod refresh_token;
mod register;
mod request;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::Cli;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the credential
    Login(login::LoginArgs),

    /// End the session and delete stored credentials
    Logout(logout::LogoutArgs),

    /// Display the logged-in user
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for a new access token
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Create a new account
    Register(register::RegisterArgs),

    /// Email a registration verification code
    Captcha(captcha::CaptchaArgs),

    /// Send an authenticated request to the API
    Request(request::RequestArgs),
}

pub async fn handle(cli: Cli) -> Result<()> {
    let settings = cli.settings;
    match cli.command {
        Command::Login(args) => login::run(&settings, args).await,
        Command::Logout(args) => logout::run(&settings, args).await,
        Command::Whoami(args) => whoami::run(&settings, args).await,
        Command::RefreshToken(args) => refresh_token::run(&settings, args).await,
        Command::Register(args) => register::run(&settings, args).await,
        Command::Captcha(args) => captcha::run(&settings, args).await,
        Command::Request(args) => request::run(&settings, args).await,
    }
}
