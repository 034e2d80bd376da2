//! Bearer token lookup.

use async_trait::async_trait;

/// Supplies the bearer token attached to outgoing requests.
///
/// A provider never fails a request: lookup problems are reported as
/// "no token" and the request goes out unauthenticated.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current token, if one is stored.
    async fn auth_token(&self) -> Option<String>;
}

/// Provider for anonymous clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

#[async_trait]
impl TokenProvider for NoToken {
    async fn auth_token(&self) -> Option<String> {
        None
    }
}

/// Provider returning a fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wraps `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn auth_token(&self) -> Option<String> {
        Some(self.0.clone()).filter(|t| !t.is_empty())
    }
}
