//! Request command implementation.

use std::io::{self, Read};

use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde_json::Value;

use tokenward_http::{ApiRequest, Method};

use crate::cli::Settings;
use crate::context;
use crate::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path relative to the API base URL
    pub path: String,

    /// JSON request body (use - for stdin)
    #[arg(long)]
    pub data: Option<String>,

    /// Query parameter as key=value; may be repeated
    #[arg(long = "query", short = 'q', value_parser = parse_query)]
    pub query: Vec<(String, String)>,
}

fn parse_query(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

fn read_body(data: &str) -> Result<Value> {
    if data == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        serde_json::from_str(&buf).context("Invalid JSON from stdin")
    } else {
        serde_json::from_str(data).context("Invalid JSON in --data")
    }
}

pub async fn run(settings: &Settings, args: RequestArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method '{}'", args.method))?;

    let mut request = ApiRequest::new(method, &args.path);
    for (key, value) in args.query {
        request = request.with_query(key, value);
    }
    if let Some(data) = &args.data {
        request = request
            .with_json(&read_body(data)?)
            .context("Invalid request body")?;
    }

    let session = context::open_session(settings)?;
    let response = session
        .client()
        .send(&request)
        .await
        .with_context(|| format!("{} {} failed", request.method(), request.path()))?;

    match response.json_value() {
        Ok(Value::Null) => {}
        Ok(body) => output::json_pretty(&body)?,
        Err(_) => println!("{}", response.text()),
    }

    Ok(())
}
