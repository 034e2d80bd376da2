//! reqwest-backed transport with tracing and domain allowlist.
//!
//! The underlying client is built without a cookie store, so no ambient
//! credentials ever travel with a request; authentication is the bearer
//! token the orchestrator attaches.
//!
//! Relative URLs (the same-origin case) are resolved against a configured
//! page origin. Without one they are rejected.

use std::time::Duration;

use async_trait::async_trait;
use orthoqa_core::{is_absolute_url, ApiError, HttpRequest, HttpResponse, Method};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::transport::Transport;

/// Connection establishment timeout. Whole-request timeouts belong to the orchestrator.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// User agent string for `OrthoQA`.
const USER_AGENT: &str = concat!("orthoqa/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Reqwest Transport
// ============================================================================

/// HTTP transport over reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
    origin: Option<Url>,
    allowed_domains: Option<Vec<String>>,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            inner: client,
            origin: None,
            allowed_domains: None,
        })
    }

    /// Resolves relative URLs against `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if `origin` is not a valid absolute URL.
    pub fn with_origin(mut self, origin: &str) -> Result<Self, ApiError> {
        let origin = Url::parse(origin)
            .map_err(|e| ApiError::Transport(format!("invalid origin {origin}: {e}")))?;
        self.origin = Some(origin);
        Ok(self)
    }

    /// Only permits requests to `domains` and their subdomains.
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Turns the request URL into an absolute URL.
    fn absolute_url(&self, url: &str) -> Result<Url, ApiError> {
        if is_absolute_url(url) {
            return Url::parse(url).map_err(|e| ApiError::Transport(format!("invalid URL {url}: {e}")));
        }
        let origin = self.origin.as_ref().ok_or_else(|| {
            ApiError::Transport(format!("relative URL {url} requires a configured origin"))
        })?;
        origin
            .join(url)
            .map_err(|e| ApiError::Transport(format!("invalid URL {url}: {e}")))
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &Url) -> Result<(), ApiError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(()); // No restrictions
        };

        let host = url
            .host_str()
            .ok_or_else(|| ApiError::Transport(format!("no host in URL {url}")))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(ApiError::Transport(format!("domain not allowed: {host}")))
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = self.absolute_url(&request.url)?;
        self.is_domain_allowed(&url)?;

        let mut builder = self.inner.request(to_reqwest_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        debug!(status, "Response received");

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_allowlist() {
        let transport = ReqwestTransport::new()
            .unwrap()
            .with_allowed_domains(vec!["qa.example.org".to_string(), "example.net".to_string()]);

        let allowed = Url::parse("https://qa.example.org/api/topics").unwrap();
        let subdomain = Url::parse("https://cdn.example.net/x").unwrap();
        let denied = Url::parse("https://evil.com/steal").unwrap();

        assert!(transport.is_domain_allowed(&allowed).is_ok());
        assert!(transport.is_domain_allowed(&subdomain).is_ok());
        assert!(transport.is_domain_allowed(&denied).is_err());
    }

    #[test]
    fn test_relative_url_needs_origin() {
        let transport = ReqwestTransport::new().unwrap();
        assert!(matches!(
            transport.absolute_url("/api/topics"),
            Err(ApiError::Transport(_))
        ));

        let transport = transport.with_origin("https://qa.example.org/").unwrap();
        assert_eq!(
            transport.absolute_url("/api/topics").unwrap().as_str(),
            "https://qa.example.org/api/topics"
        );
    }

    #[test]
    fn test_absolute_url_passthrough() {
        let transport = ReqwestTransport::new().unwrap();
        assert_eq!(
            transport.absolute_url("https://qa.example.org/api/ask").unwrap().as_str(),
            "https://qa.example.org/api/ask"
        );
    }

    #[test]
    fn test_invalid_origin_rejected() {
        assert!(ReqwestTransport::new().unwrap().with_origin("not a url").is_err());
    }
}
