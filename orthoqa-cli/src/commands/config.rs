//! Config command - manage configuration.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use orthoqa_store::{default_config_dir, default_token_path, parse_bool, SettingsStore};
use tracing::info;

use super::load_store;
use crate::output::JsonFormatter;
use crate::Cli;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file plus environment overrides).
    Show,

    /// Show configuration paths.
    Path,

    /// Set the remote app URL requests go to when native.
    SetRemote {
        /// Absolute http(s) URL.
        url: String,
    },

    /// Enable or disable native mode.
    SetNative {
        /// true/false, yes/no, on/off, 1/0.
        value: String,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => {
            show_paths(cli);
            Ok(())
        }
        ConfigAction::SetRemote { url } => set_remote(url, cli).await,
        ConfigAction::SetNative { value } => set_native(value, cli).await,
        ConfigAction::Reset => reset_config(cli).await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let store = load_store(cli).await?;
    let settings = store.effective().await?;
    JsonFormatter::new(cli.pretty).print(&settings)
}

fn show_paths(cli: &Cli) {
    println!("Config dir:    {}", default_config_dir().display());
    println!("Settings file: {}", cli.settings_path().display());
    println!("Token file:    {}", default_token_path().display());
}

async fn set_remote(url: &str, cli: &Cli) -> Result<()> {
    let store = load_store(cli).await?;
    store.set_remote_url(url).await?;
    store.save().await?;

    info!(url = %url, "Remote app URL updated");
    println!("Remote app URL set to: {}", url.trim());
    Ok(())
}

async fn set_native(value: &str, cli: &Cli) -> Result<()> {
    let native = parse_bool(value).ok_or_else(|| anyhow!("Expected a boolean, got {value:?}"))?;

    let store = load_store(cli).await?;
    store.update(|s| s.native = native).await;
    store.save().await?;

    info!(native, "Native mode updated");
    println!("Native mode: {native}");
    Ok(())
}

async fn reset_config(cli: &Cli) -> Result<()> {
    // Skips loading so a broken file can still be reset.
    let store = SettingsStore::new(cli.settings_path());
    store.save().await?;

    info!(path = %store.path().display(), "Settings reset");
    println!("Configuration reset to defaults");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Cli, Commands};
    use clap::Parser;

    use super::ConfigAction;

    #[test]
    fn test_config_parsing() {
        let cli = Cli::try_parse_from(["orthoqa", "config", "set-remote", "https://qa.example.org"])
            .unwrap();
        let Commands::Config(args) = cli.command else {
            panic!("expected config command");
        };
        assert!(matches!(
            args.action,
            ConfigAction::SetRemote { ref url } if url == "https://qa.example.org"
        ));
    }

    #[test]
    fn test_set_native_parsing() {
        let cli = Cli::try_parse_from(["orthoqa", "config", "set-native", "false"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(super::ConfigArgs {
                action: ConfigAction::SetNative { .. }
            })
        ));
    }
}
