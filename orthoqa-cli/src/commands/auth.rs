//! Login and logout commands.

use anyhow::{anyhow, Result};
use clap::Args;
use orthoqa_fetch::RequestOptions;
use orthoqa_store::ChainedTokenProvider;
use serde_json::{json, Value};
use tracing::info;

use super::{load_store, Session};
use crate::Cli;

/// Login endpoint of the native API.
pub const DEFAULT_LOGIN_ENDPOINT: &str = "/api/native/auth/login";

/// Arguments for the login command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account name.
    #[arg(long, short)]
    pub username: String,

    /// Account password.
    #[arg(long, short)]
    pub password: String,

    /// Login endpoint.
    #[arg(long, default_value = DEFAULT_LOGIN_ENDPOINT)]
    pub endpoint: String,
}

/// Posts credentials and stores the returned session token.
pub async fn login(args: &LoginArgs, cli: &Cli) -> Result<()> {
    let session = Session::open(cli).await?;

    let credentials = json!({
        "username": args.username,
        "password": args.password,
    });
    let response: Value = session
        .client
        .post(&args.endpoint, &credentials, RequestOptions::new())
        .await?;

    let token = extract_token(&response)
        .ok_or_else(|| anyhow!("login response did not contain a token"))?;
    let stored_in = session.tokens.set(token).await?;

    info!(backend = %stored_in, "Session token stored");
    if !cli.quiet {
        println!("Logged in as {} (token stored in {stored_in})", args.username);
    }
    Ok(())
}

/// Clears the stored session token.
pub async fn logout(cli: &Cli) -> Result<()> {
    let settings = load_store(cli).await?.effective().await?;
    let tokens = ChainedTokenProvider::from_backend(settings.token_backend);
    tokens.clear().await?;

    if !cli.quiet {
        println!("Logged out");
    }
    Ok(())
}

/// Token from a login response: `token`, or `accessToken` as sent by older servers.
fn extract_token(response: &Value) -> Option<&str> {
    ["token", "accessToken"]
        .iter()
        .filter_map(|key| response.get(*key).and_then(Value::as_str))
        .find(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token(&json!({"token": "abc"})), Some("abc"));
        assert_eq!(extract_token(&json!({"accessToken": "xyz"})), Some("xyz"));
        assert_eq!(
            extract_token(&json!({"token": "", "accessToken": "xyz"})),
            Some("xyz")
        );
        assert_eq!(extract_token(&json!({"token": 42})), None);
        assert_eq!(extract_token(&json!("abc")), None);
    }

    #[test]
    fn test_login_parsing() {
        let cli = Cli::try_parse_from(["orthoqa", "login", "-u", "reader", "-p", "secret"]).unwrap();
        let Commands::Login(args) = cli.command else {
            panic!("expected login command");
        };
        assert_eq!(args.username, "reader");
        assert_eq!(args.endpoint, DEFAULT_LOGIN_ENDPOINT);
    }
}
