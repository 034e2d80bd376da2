//! Host APIs backing the client.
//!
//! - [`http`] - reqwest transport with optional domain allowlist
//! - [`keychain`] - Bearer token storage in the system keychain

pub mod http;
pub mod keychain;

pub use http::ReqwestTransport;
pub use keychain::KeychainTokenStore;
