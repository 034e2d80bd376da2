// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `OrthoQA` Fetch
//!
//! The hardened client the native app uses to talk to the `OrthoQA` JSON API.
//!
//! ## Request pipeline
//!
//! - [`client::ApiClient`] - Orchestrates every request (blocked check, cache, dedup, attempts)
//! - [`cache::ResponseCache`] - TTL cache for GET payloads, lazily expired
//! - [`inflight::InFlightRegistry`] - At most one concurrent request per cache key
//! - [`retry::RetryPolicy`] - Immediate retries on 408, 429 and 5xx
//! - [`response`] - Content-type gate and HTML sniffing
//! - [`signal::CancelSignal`] - Caller-owned cancellation
//!
//! ## Host APIs
//!
//! - [`transport::Transport`] - Network seam, implemented by [`host::http::ReqwestTransport`]
//! - [`auth::TokenProvider`] - Bearer token lookup, implemented by [`host::keychain::KeychainTokenStore`]
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use orthoqa_core::RuntimeConfig;
//! use orthoqa_fetch::{ApiClient, RequestOptions};
//!
//! let client = ApiClient::builder()
//!     .runtime(RuntimeConfig::native("https://qa.example.org"))
//!     .build()?;
//!
//! let topics: Vec<Topic> = client
//!     .get("/api/topics", RequestOptions::new().cache_ttl(Duration::from_secs(5)))
//!     .await?;
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

// Core modules
pub mod auth;
pub mod cache;
pub mod client;
pub mod context;
pub mod error;
pub mod host;
pub mod inflight;
pub mod request;
pub mod response;
pub mod retry;
pub mod signal;
pub mod transport;


// Re-export key types at crate root
pub use auth::{NoToken, StaticToken, TokenProvider};
pub use cache::ResponseCache;
pub use client::ApiClient;
pub use context::{ApiClientBuilder, ClientSettings, DEFAULT_TIMEOUT};
pub use error::KeychainError;
pub use host::{http::ReqwestTransport, keychain::KeychainTokenStore};
pub use inflight::{Flight, InFlightRegistry};
pub use request::RequestOptions;
pub use response::{looks_like_html, parse_body};
pub use retry::{is_retryable_status, RetryPolicy};
pub use signal::CancelSignal;
pub use transport::Transport;

/// Locks `mutex`, recovering the data if a previous holder panicked.
///
/// Every critical section in this crate is a single map operation, so the
/// data is consistent even after a poisoning panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
