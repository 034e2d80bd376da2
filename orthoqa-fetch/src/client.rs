//! Hardened API client.
//!
//! Every request walks the same sequence:
//!
//! 1. **Blocked** - a native startup error fails the request before any I/O.
//! 2. **Cache** - a live cached GET payload is returned as-is.
//! 3. **In-flight** - a pending request with the same key is joined.
//! 4. **Attempts** - otherwise a new attempt sequence is registered and run:
//!    assemble headers, attach the bearer token, send under a timeout, gate
//!    the content type, parse, and retry transient statuses immediately
//!    until the budget runs out.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use orthoqa_core::{
    derive_cache_key, resolve_url, ApiError, HttpRequest, HttpResponse, Method, RuntimeConfig,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, trace, warn};

use crate::auth::TokenProvider;
use crate::cache::ResponseCache;
use crate::context::{ApiClientBuilder, ClientSettings};
use crate::inflight::InFlightRegistry;
use crate::request::RequestOptions;
use crate::response::parse_body;
use crate::retry::RetryPolicy;
use crate::transport::Transport;

const JSON_MEDIA_TYPE: &str = "application/json";

// ============================================================================
// API Client
// ============================================================================

/// JSON API client with deduplication, TTL caching, and bounded retries.
///
/// Cloning is cheap; clones share the cache and the in-flight registry.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    runtime: RuntimeConfig,
    settings: ClientSettings,
    cache: ResponseCache,
    in_flight: InFlightRegistry,
}

/// Everything one attempt sequence needs, owned so it can outlive the caller.
struct RequestPlan {
    url: String,
    key: String,
    cache_ttl: Option<Duration>,
    options: RequestOptions,
}

impl ApiClient {
    /// Creates a builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenProvider>,
        runtime: RuntimeConfig,
        settings: ClientSettings,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                tokens,
                runtime,
                settings,
                cache: ResponseCache::new(),
                in_flight: InFlightRegistry::new(),
            }),
        }
    }

    /// Runtime configuration this client was built with.
    pub fn runtime(&self) -> &RuntimeConfig {
        &self.inner.runtime
    }

    /// Settings this client was built with.
    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    /// Key a request for `path` with `options` is cached and deduplicated under.
    pub fn cache_key_for(&self, path: &str, options: &RequestOptions) -> String {
        let url = resolve_url(path, &self.inner.runtime);
        cache_key(&url, options)
    }

    /// Drops the cached payload under `key`.
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.cache.invalidate(key)
    }

    /// Drops every cached payload.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Number of requests currently on the wire.
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Performs a request and returns the raw JSON payload.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]. Structured errors ([`ApiError::Status`],
    /// [`ApiError::UnexpectedContentType`]) mean the server answered; all
    /// other variants mean it did not, or not with an API response.
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request_value(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        if let Some(reason) = self.inner.runtime.blocked_reason() {
            warn!(reason = %reason, "Request blocked by native startup error");
            return Err(ApiError::Blocked(reason.to_string()));
        }

        let url = resolve_url(path, &self.inner.runtime);
        let key = cache_key(&url, &options);
        let cache_ttl = options.effective_cache_ttl();

        if cache_ttl.is_some() {
            if let Some(data) = self.inner.cache.get(&key) {
                trace!(key = %key, "Cache hit");
                return Ok(data);
            }
        }

        let inner = Arc::clone(&self.inner);
        let flight = self.inner.in_flight.join_or_start(&key, || {
            let plan = RequestPlan {
                url,
                key: key.clone(),
                cache_ttl,
                options,
            };
            async move { inner.run(plan).await }.boxed()
        });

        if flight.is_joined() {
            trace!(key = %key, "Joined in-flight request");
        }
        flight.outcome().await
    }

    /// Performs a request and decodes the payload into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`request_value`](Self::request_value) returns, plus
    /// [`ApiError::Decode`] when the payload does not match `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let value = self.request_value(path, options).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// GET `path`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(path, options.method(Method::Get)).await
    }

    /// POST `body` to `path`.
    ///
    /// # Errors
    ///
    /// [`ApiError::Serialize`] if `body` cannot be encoded, otherwise see [`request`](Self::request).
    pub async fn post<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Post, path, body, options).await
    }

    /// PUT `body` to `path`.
    ///
    /// # Errors
    ///
    /// Same as [`post`](Self::post).
    pub async fn put<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Put, path, body, options).await
    }

    /// PATCH `path` with `body`.
    ///
    /// # Errors
    ///
    /// Same as [`post`](Self::post).
    pub async fn patch<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::Patch, path, body, options).await
    }

    /// DELETE `path`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(path, options.method(Method::Delete)).await
    }

    async fn send_with_body<T, B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Serialize(e.to_string()))?;
        self.request(path, options.method(method).body(body)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("runtime", &self.inner.runtime)
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

fn cache_key(url: &str, options: &RequestOptions) -> String {
    options
        .cache_key
        .clone()
        .unwrap_or_else(|| derive_cache_key(options.method, url, options.body.as_ref()))
}

// ============================================================================
// Attempt Loop
// ============================================================================

impl ClientInner {
    async fn run(&self, plan: RequestPlan) -> Result<Value, ApiError> {
        let method = plan.options.method;
        let policy = RetryPolicy::for_method(method, plan.options.retries, self.settings.get_retries);
        let timeout = plan.options.timeout.unwrap_or(self.settings.default_timeout);
        let body = encode_body(&plan.options)?;

        let mut attempt = 1;
        loop {
            debug!(url = %plan.url, attempt, max_attempts = policy.max_attempts(), "Sending request");
            let response = self.attempt(&plan, body.clone(), timeout).await?;
            debug!(status = response.status, attempt, "Response received");

            let payload = parse_body(&response)?;

            if response.is_success() {
                if let Some(ttl) = plan.cache_ttl {
                    self.cache.insert(plan.key.clone(), payload.clone(), ttl);
                }
                return Ok(payload);
            }

            if let Some(next) = policy.next_attempt(attempt, response.status) {
                warn!(
                    status = response.status,
                    attempt,
                    url = %plan.url,
                    "Transient failure, retrying"
                );
                attempt = next;
                continue;
            }

            return Err(ApiError::from_status(response.status, payload));
        }
    }

    /// One attempt: headers, token, transport round-trip, all under one deadline.
    ///
    /// The deadline, the external signal, and the round-trip race; the first to
    /// finish decides the attempt. Dropping the losers releases the timer.
    async fn attempt(
        &self,
        plan: &RequestPlan,
        body: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<HttpResponse, ApiError> {
        let deadline = tokio::time::sleep(timeout);
        let cancelled = async {
            match &plan.options.signal {
                Some(signal) => signal.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let exchange = async {
            let headers = self.headers(&plan.options, body.is_some()).await;
            let request = HttpRequest {
                method: plan.options.method,
                url: plan.url.clone(),
                headers,
                body,
            };
            self.transport.send(request).await
        };

        tokio::select! {
            biased;
            () = cancelled => {
                debug!(url = %plan.url, "Request cancelled");
                Err(ApiError::Cancelled)
            }
            () = deadline => {
                warn!(url = %plan.url, timeout_ms = timeout.as_millis(), "Request timed out");
                Err(ApiError::Timeout(timeout))
            }
            result = exchange => result,
        }
    }

    /// Caller headers, then `Content-Type` default, `Accept`, and `Authorization`.
    async fn headers(&self, options: &RequestOptions, has_body: bool) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = options
            .headers
            .iter()
            .filter(|(name, _)| {
                !name.eq_ignore_ascii_case("accept") && !name.eq_ignore_ascii_case("authorization")
            })
            .cloned()
            .collect();

        let has_content_type = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
        if has_body && !has_content_type {
            headers.push(("Content-Type".to_string(), JSON_MEDIA_TYPE.to_string()));
        }

        headers.push(("Accept".to_string(), JSON_MEDIA_TYPE.to_string()));

        if let Some(token) = self.tokens.auth_token().await {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        headers
    }
}

/// Encodes the body for methods that transmit one.
fn encode_body(options: &RequestOptions) -> Result<Option<Vec<u8>>, ApiError> {
    if !options.method.sends_body() {
        return Ok(None);
    }
    options
        .body
        .as_ref()
        .map(|body| serde_json::to_vec(body).map_err(|e| ApiError::Serialize(e.to_string())))
        .transpose()
}
