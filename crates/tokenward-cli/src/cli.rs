//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::commands::Command;

/// Log in to a token-authenticated API and make requests with the session.
#[derive(Parser, Debug)]
#[command(name = "tokenward")]
#[command(author, version = env!("TOKENWARD_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the API lives and where credentials are kept.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// API base URL
    #[arg(
        long,
        env = "TOKENWARD_API_URL",
        default_value = "http://localhost:8000/api",
        global = true
    )]
    pub api_url: String,

    /// Directory for remembered credentials [default: platform data dir]
    #[arg(long, env = "TOKENWARD_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory for credentials that end with the login session
    /// [default: platform runtime dir]
    #[arg(long, env = "TOKENWARD_RUNTIME_DIR", global = true)]
    pub runtime_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "TOKENWARD_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    /// Append a trailing slash to the auth endpoint paths
    #[arg(long, env = "TOKENWARD_TRAILING_SLASHES", global = true)]
    pub trailing_slashes: bool,
}
