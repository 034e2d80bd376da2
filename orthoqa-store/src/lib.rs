// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `OrthoQA` Store
//!
//! Everything the client reads from disk.
//!
//! This crate provides:
//!
//! - **Settings**: Runtime configuration and client defaults, with env overrides
//! - **SettingsStore**: Persistent settings behind a lock
//! - **Tokens**: File-backed fallback token store and the keychain-first chain
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use orthoqa_fetch::ApiClient;
//! use orthoqa_store::{ChainedTokenProvider, SettingsStore};
//!
//! let store = SettingsStore::load_default().await?;
//! let settings = store.effective().await?;
//!
//! let client = ApiClient::builder()
//!     .runtime(settings.runtime_config())
//!     .settings(settings.client_settings())
//!     .token_provider(Arc::new(ChainedTokenProvider::from_backend(settings.token_backend)))
//!     .build()?;
//! ```

pub mod error;
pub mod persistence;
pub mod settings;
pub mod token_store;

pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_settings_path, default_token_path, load_json,
    load_json_or_default, save_json,
};
pub use settings::{parse_bool, validate_remote_url, LogLevel, Settings, SettingsStore, TokenBackend};
pub use token_store::{ChainedTokenProvider, FileTokenStore};
