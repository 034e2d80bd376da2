//! CLI command implementations.

pub mod auth;
pub mod config;
pub mod request;

use std::sync::Arc;

use anyhow::{Context, Result};
use orthoqa_fetch::{ApiClient, ReqwestTransport};
use orthoqa_store::{ChainedTokenProvider, SettingsStore};
use tracing::debug;

use crate::Cli;

/// Loads the settings store this invocation works on.
pub async fn load_store(cli: &Cli) -> Result<SettingsStore> {
    let path = cli.settings_path();
    SettingsStore::load(path.clone())
        .await
        .with_context(|| format!("failed to load settings from {}", path.display()))
}

/// Everything a networked command needs.
pub struct Session {
    pub tokens: Arc<ChainedTokenProvider>,
    pub client: ApiClient,
}

impl Session {
    /// Builds the client from the effective settings.
    pub async fn open(cli: &Cli) -> Result<Self> {
        let store = load_store(cli).await?;
        let settings = store.effective().await?;

        // The remote app URL doubles as the origin for relative paths outside the native shell.
        let runtime = settings.runtime_config();
        let mut transport = ReqwestTransport::new()?;
        if let Some(origin) = runtime.remote_origin() {
            transport = transport.with_origin(origin)?;
        }

        let tokens = Arc::new(ChainedTokenProvider::from_backend(settings.token_backend));
        let client = ApiClient::builder()
            .transport(Arc::new(transport))
            .token_provider(tokens.clone())
            .runtime(runtime)
            .settings(settings.client_settings())
            .build()?;

        debug!(?client, backend = %settings.token_backend, "Client ready");
        Ok(Self {
            tokens,
            client,
        })
    }
}
