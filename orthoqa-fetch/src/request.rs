//! Per-request options.

use std::time::Duration;

use orthoqa_core::Method;
use serde_json::Value;

use crate::signal::CancelSignal;

/// Options for one logical request.
///
/// Unset fields fall back to the client's [`ClientSettings`](crate::ClientSettings).
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: Method,
    /// JSON body. Never transmitted for GET or HEAD.
    pub body: Option<Value>,
    /// Extra headers. `Accept` and `Authorization` are always set by the client.
    pub headers: Vec<(String, String)>,
    /// External cancellation.
    pub signal: Option<CancelSignal>,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Retry budget.
    pub retries: Option<u32>,
    /// Explicit cache/dedup key.
    pub cache_key: Option<String>,
    /// Cache lifetime for GET responses.
    pub cache_ttl: Option<Duration>,
}

impl RequestOptions {
    /// Default options (GET, no body).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attaches an external cancellation signal.
    #[must_use]
    pub fn signal(mut self, signal: CancelSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Overrides the derived cache key.
    #[must_use]
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Enables caching for `ttl` (GET only).
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// TTL to apply, if this request is cacheable at all.
    pub(crate) fn effective_cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl
            .filter(|ttl| self.method == Method::Get && !ttl.is_zero())
    }
}
