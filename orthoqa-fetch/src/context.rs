//! Client settings and construction.
//!
//! Everything the client depends on (transport, token provider, runtime
//! configuration) is injected here, once, instead of being looked up from
//! globals on every request.

use std::sync::Arc;
use std::time::Duration;

use orthoqa_core::{ApiError, Method, RuntimeConfig};

use crate::auth::{NoToken, TokenProvider};
use crate::client::ApiClient;
use crate::host::http::ReqwestTransport;
use crate::transport::Transport;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

// ============================================================================
// Client Settings
// ============================================================================

/// Defaults applied when a request leaves an option unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Per-attempt timeout.
    pub default_timeout: Duration,
    /// Retry budget for GET requests.
    pub get_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            get_retries: Method::Get.default_retries(),
        }
    }
}

impl ClientSettings {
    /// Sets the default timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Sets the GET retry budget.
    #[must_use]
    pub fn with_get_retries(mut self, retries: u32) -> Self {
        self.get_retries = retries;
        self
    }
}

// ============================================================================
// Client Builder
// ============================================================================

/// Builder for [`ApiClient`].
#[derive(Default)]
pub struct ApiClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    tokens: Option<Arc<dyn TokenProvider>>,
    runtime: RuntimeConfig,
    settings: ClientSettings,
}

impl ApiClientBuilder {
    /// Creates a builder with web defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the token provider.
    #[must_use]
    pub fn token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Sets the runtime configuration.
    #[must_use]
    pub fn runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    /// Sets the client settings.
    #[must_use]
    pub fn settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the client.
    ///
    /// Without an explicit transport, a [`ReqwestTransport`] is created.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the default HTTP client cannot be built.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let tokens = self.tokens.unwrap_or_else(|| Arc::new(NoToken));
        Ok(ApiClient::from_parts(transport, tokens, self.runtime, self.settings))
    }
}
