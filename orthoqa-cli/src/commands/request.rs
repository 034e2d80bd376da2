//! Request commands - send arbitrary requests through the client.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use orthoqa_core::Method;
use orthoqa_fetch::RequestOptions;
use serde_json::Value;

use super::Session;
use crate::output::JsonFormatter;
use crate::Cli;

/// Options shared by every request command.
#[derive(Args, Debug, Default)]
pub struct RequestFlags {
    /// Extra header as `Name: value`. Repeatable.
    #[arg(long = "header", short = 'H', value_name = "K:V", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Per-attempt timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Retry budget for transient failures.
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Cache GET responses for this many milliseconds.
    #[arg(long, value_name = "MS")]
    pub cache_ttl_ms: Option<u64>,
}

/// Arguments for the request command.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, HEAD).
    pub method: Method,

    /// Path (`/api/...`) or absolute URL.
    pub path: String,

    /// JSON request body.
    #[arg(long, value_name = "JSON")]
    pub body: Option<String>,

    #[command(flatten)]
    pub flags: RequestFlags,
}

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path (`/api/...`) or absolute URL.
    pub path: String,

    #[command(flatten)]
    pub flags: RequestFlags,
}

/// Arguments for the post command.
#[derive(Args, Debug)]
pub struct PostArgs {
    /// Path (`/api/...`) or absolute URL.
    pub path: String,

    /// JSON request body.
    #[arg(long, value_name = "JSON")]
    pub body: String,

    #[command(flatten)]
    pub flags: RequestFlags,
}

/// Runs the request command.
pub async fn run(args: &RequestArgs, cli: &Cli) -> Result<()> {
    let body = args.body.as_deref().map(parse_body).transpose()?;
    send(&args.path, build_options(args.method, body, &args.flags), cli).await
}

/// Runs the get command.
pub async fn run_get(args: &GetArgs, cli: &Cli) -> Result<()> {
    send(&args.path, build_options(Method::Get, None, &args.flags), cli).await
}

/// Runs the post command.
pub async fn run_post(args: &PostArgs, cli: &Cli) -> Result<()> {
    let body = parse_body(&args.body)?;
    send(&args.path, build_options(Method::Post, Some(body), &args.flags), cli).await
}

async fn send(path: &str, options: RequestOptions, cli: &Cli) -> Result<()> {
    let session = Session::open(cli).await?;
    let payload = session.client.request_value(path, options).await?;
    JsonFormatter::new(cli.pretty).print(&payload)
}

fn build_options(method: Method, body: Option<Value>, flags: &RequestFlags) -> RequestOptions {
    let mut options = RequestOptions::new().method(method);
    if let Some(body) = body {
        options = options.body(body);
    }
    for (name, value) in &flags.headers {
        options = options.header(name.as_str(), value.as_str());
    }
    if let Some(ms) = flags.timeout_ms {
        options = options.timeout(Duration::from_millis(ms));
    }
    if let Some(retries) = flags.retries {
        options = options.retries(retries);
    }
    if let Some(ms) = flags.cache_ttl_ms {
        options = options.cache_ttl(Duration::from_millis(ms));
    }
    options
}

fn parse_body(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("--body is not valid JSON")
}

/// Parses `Name: value` (or `Name:value`).
fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
