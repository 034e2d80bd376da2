//! Network transport seam.

use async_trait::async_trait;
use orthoqa_core::{ApiError, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
///
/// Implementations return every response the server produced, whatever its
/// status; only failures below HTTP (DNS, connect, TLS, reading the body)
/// become errors, reported as [`ApiError::Transport`]. Timeouts and
/// cancellation are enforced by the caller, which drops the returned future.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and reads the complete response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}
