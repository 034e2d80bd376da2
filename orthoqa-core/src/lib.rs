// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `OrthoQA` Core
//!
//! Plain data shared by every `OrthoQA` crate. Nothing in here performs I/O.
//!
//! - [`RuntimeConfig`] - Whether the app runs inside the native shell, and where to send requests
//! - [`Method`] - HTTP methods the client understands
//! - [`HttpRequest`] / [`HttpResponse`] - Transport data exchanged with the network layer
//! - [`resolve_url`] - Same-origin vs. remote URL resolution
//! - [`derive_cache_key`] - Deterministic identity of a logical request
//! - [`ApiError`] - Every way a request can fail

pub mod cache_key;
pub mod config;
pub mod error;
pub mod http;
pub mod url;

pub use cache_key::{canonical_json, derive_cache_key};
pub use config::RuntimeConfig;
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse, Method};
pub use url::{is_absolute_url, resolve_url};
