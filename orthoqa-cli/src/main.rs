// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `OrthoQA` CLI - talk to the `OrthoQA` API through the hardened client.
//!
//! # Examples
//!
//! ```bash
//! # Point the client at the hosted app
//! orthoqa config set-remote https://qa.example.org
//! orthoqa config set-native true
//!
//! # Log in and keep the session token
//! orthoqa login --username reader --password secret
//!
//! # Cached GET
//! orthoqa get /api/topics --cache-ttl-ms 5000 --pretty
//!
//! # Ask a question
//! orthoqa post /api/ask --body '{"question": "Why do we fast?"}'
//!
//! # Anything else
//! orthoqa request DELETE /api/questions/7 -H 'X-Locale: ar'
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use orthoqa_store::{default_settings_path, load_json_or_default, LogLevel, Settings};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{auth, config, request};

// ============================================================================
// CLI Definition
// ============================================================================

/// `OrthoQA` CLI - hardened API client.
#[derive(Parser)]
#[command(name = "orthoqa")]
#[command(about = "Command-line client for the OrthoQA API")]
#[command(long_about = r#"
Sends requests through the same hardened client the native app uses:
bearer token from the keychain, deduplication, response caching,
content-type checks and immediate retries on transient failures.

Examples:
  orthoqa get /api/topics               # GET, retried on 408/429/5xx
  orthoqa post /api/ask --body '{}'     # POST, never retried by default
  orthoqa login -u reader -p secret     # Store a session token
  orthoqa config show                   # Effective configuration
"#)]
#[command(version)]
#[command(author = "OrthoQA Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (no logging, errors only).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Settings file to use instead of the default.
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

impl Cli {
    /// Settings file this invocation reads and writes.
    pub fn settings_path(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(default_settings_path)
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Send a request with any method.
    #[command(visible_alias = "r")]
    Request(request::RequestArgs),

    /// Send a GET request.
    Get(request::GetArgs),

    /// Send a POST request with a JSON body.
    Post(request::PostArgs),

    /// Log in and store the returned session token.
    Login(auth::LoginArgs),

    /// Remove the stored session token.
    Logout,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("orthoqa=debug")
    } else {
        EnvFilter::new(format!("orthoqa={level}"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only the log level is needed here; the file is validated when a command loads it.
    let settings: Settings = load_json_or_default(&cli.settings_path()).await;
    setup_logging(cli.verbose, cli.quiet, settings.log_level);

    let result = match &cli.command {
        Commands::Request(args) => request::run(args, &cli).await,
        Commands::Get(args) => request::run_get(args, &cli).await,
        Commands::Post(args) => request::run_post(args, &cli).await,
        Commands::Login(args) => auth::login(args, &cli).await,
        Commands::Logout => auth::logout(&cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        output::report_error(&e);
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
