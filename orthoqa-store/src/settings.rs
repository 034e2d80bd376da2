//! User settings and the configuration the client is built from.
//!
//! Settings are read from `settings.json`. A handful of environment variables
//! override the file for one process without rewriting it:
//!
//! | Variable              | Field          |
//! |-----------------------|----------------|
//! | `ORTHOQA_REMOTE_URL`  | `remote_app_url` |
//! | `ORTHOQA_NATIVE`      | `native`       |
//! | `ORTHOQA_NATIVE_ERROR`| `native_error` |
//! | `ORTHOQA_TIMEOUT_MS`  | `timeout_ms`   |

use orthoqa_core::RuntimeConfig;
use orthoqa_fetch::{ClientSettings, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

/// Environment variable overriding [`Settings::remote_app_url`].
pub const ENV_REMOTE_URL: &str = "ORTHOQA_REMOTE_URL";
/// Environment variable overriding [`Settings::native`].
pub const ENV_NATIVE: &str = "ORTHOQA_NATIVE";
/// Environment variable overriding [`Settings::native_error`].
pub const ENV_NATIVE_ERROR: &str = "ORTHOQA_NATIVE_ERROR";
/// Environment variable overriding [`Settings::timeout_ms`].
pub const ENV_TIMEOUT_MS: &str = "ORTHOQA_TIMEOUT_MS";

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Origin of the hosted app, used when running natively.
    pub remote_app_url: Option<String>,

    /// Whether requests go to `remote_app_url` instead of the same origin.
    pub native: bool,

    /// Startup failure that blocks every request while set.
    pub native_error: Option<String>,

    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,

    /// Retry budget for GET requests.
    pub get_retries: u32,

    /// Log level used when neither `--verbose` nor `--quiet` is given.
    pub log_level: LogLevel,

    /// Where the bearer token is kept.
    pub token_backend: TokenBackend,
}

impl Default for Settings {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            remote_app_url: None,
            native: false,
            native_error: None,
            timeout_ms: u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(20_000),
            get_retries: client.get_retries,
            log_level: LogLevel::default(),
            token_backend: TokenBackend::default(),
        }
    }
}

impl Settings {
    /// Runtime configuration for the client.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            native: self.native,
            remote_app_url: self.remote_app_url.clone(),
            native_error: self.native_error.clone(),
        }
    }

    /// Request defaults for the client.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings::default()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_get_retries(self.get_retries)
    }

    /// Checks the values that can be set from outside.
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable remote URL or a zero timeout.
    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(url) = &self.remote_app_url {
            validate_remote_url(url)?;
        }
        if self.timeout_ms == 0 {
            return Err(StoreError::Config("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Drops values that would fail [`validate`](Self::validate), logging each one.
    ///
    /// An unusable remote URL is cleared and a zero timeout falls back to the default,
    /// so a hand-edited file can still be repaired with `config set-remote`.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if let Some(url) = self.remote_app_url.take() {
            match validate_remote_url(&url) {
                Ok(valid) => self.remote_app_url = Some(valid),
                Err(e) => warn!(error = %e, "Ignoring stored remote app URL"),
            }
        }
        if self.timeout_ms == 0 {
            warn!("Ignoring stored timeout_ms of 0, using default");
            self.timeout_ms = Self::default().timeout_ms;
        }
        self
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_REMOTE_URL) {
            debug!(var = ENV_REMOTE_URL, "Applying override");
            self.remote_app_url = Some(url).filter(|u| !u.trim().is_empty());
        }

        if let Some(raw) = lookup(ENV_NATIVE) {
            match parse_bool(&raw) {
                Some(native) => self.native = native,
                None => warn!(var = ENV_NATIVE, value = %raw, "Ignoring non-boolean override"),
            }
        }

        if let Some(error) = lookup(ENV_NATIVE_ERROR) {
            self.native_error = Some(error).filter(|e| !e.trim().is_empty());
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.timeout_ms = ms,
                _ => warn!(var = ENV_TIMEOUT_MS, value = %raw, "Ignoring invalid timeout override"),
            }
        }

        self
    }
}

/// Parses the boolean spellings accepted on the command line and in the environment.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Checks that `raw` is an absolute http(s) URL and returns it trimmed.
///
/// # Errors
///
/// Returns [`StoreError::InvalidUrl`] for anything else.
pub fn validate_remote_url(raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| StoreError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Where the bearer token is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenBackend {
    /// System keychain, falling back to the token file.
    #[default]
    Auto,
    /// System keychain only.
    Keychain,
    /// Token file only.
    File,
}

impl std::fmt::Display for TokenBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenBackend::Auto => write!(f, "auto"),
            TokenBackend::Keychain => write!(f, "keychain"),
            TokenBackend::File => write!(f, "file"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store.
///
/// Holds what is on disk. Environment overrides are applied on read by
/// [`effective`](Self::effective) and never written back.
pub struct SettingsStore {
    settings: RwLock<Settings>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store with default settings backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            settings: RwLock::new(Settings::default()),
            path,
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing or unreadable file yields defaults. Invalid values in a
    /// readable file are dropped with a warning, see [`Settings::sanitized`].
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self {
            settings: RwLock::new(settings.sanitized()),
            path,
        })
    }

    /// Path the settings are saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the stored settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Stored settings with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns error if an override produces invalid settings.
    pub async fn effective(&self) -> Result<Settings, StoreError> {
        let settings = self.get().await.with_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Updates settings in memory.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
    }

    /// Validates and sets the remote app URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUrl`] if `url` is not an absolute http(s) URL.
    pub async fn set_remote_url(&self, url: &str) -> Result<(), StoreError> {
        let url = validate_remote_url(url)?;
        self.update(|s| s.remote_app_url = Some(url)).await;
        Ok(())
    }

    /// Restores defaults in memory.
    pub async fn reset(&self) {
        self.update(|s| *s = Settings::default()).await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.native);
        assert_eq!(settings.timeout_ms, 20_000);
        assert_eq!(settings.get_retries, 2);
        assert_eq!(settings.token_backend, TokenBackend::Auto);
        assert_eq!(settings.runtime_config(), RuntimeConfig::web());
    }

    #[test]
    fn test_projection() {
        let settings = Settings {
            native: true,
            remote_app_url: Some("https://qa.example.org".to_string()),
            timeout_ms: 1_500,
            get_retries: 0,
            ..Settings::default()
        };

        assert_eq!(
            settings.runtime_config(),
            RuntimeConfig::native("https://qa.example.org")
        );
        let client = settings.client_settings();
        assert_eq!(client.default_timeout, Duration::from_millis(1_500));
        assert_eq!(client.get_retries, 0);
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::default().with_overrides(env(&[
            (ENV_REMOTE_URL, "https://qa.example.org"),
            (ENV_NATIVE, "true"),
            (ENV_NATIVE_ERROR, "bridge failed"),
            (ENV_TIMEOUT_MS, "5000"),
        ]));

        assert!(settings.native);
        assert_eq!(settings.remote_app_url.as_deref(), Some("https://qa.example.org"));
        assert_eq!(settings.native_error.as_deref(), Some("bridge failed"));
        assert_eq!(settings.timeout_ms, 5_000);
        assert_eq!(settings.runtime_config().blocked_reason(), Some("bridge failed"));
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let settings = Settings::default()
            .with_overrides(env(&[(ENV_NATIVE, "maybe"), (ENV_TIMEOUT_MS, "soon")]));
        assert_eq!(settings, Settings::default());

        let settings = Settings::default().with_overrides(env(&[(ENV_TIMEOUT_MS, "0")]));
        assert_eq!(settings.timeout_ms, 20_000);
    }

    #[test]
    fn test_blank_overrides_clear() {
        let settings = Settings {
            native_error: Some("old".to_string()),
            remote_app_url: Some("https://qa.example.org".to_string()),
            ..Settings::default()
        }
        .with_overrides(env(&[(ENV_NATIVE_ERROR, ""), (ENV_REMOTE_URL, "  ")]));

        assert!(settings.native_error.is_none());
        assert!(settings.remote_app_url.is_none());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("native"), None);
    }

    #[test]
    fn test_validate_remote_url() {
        assert_eq!(
            validate_remote_url(" https://qa.example.org/ ").unwrap(),
            "https://qa.example.org/"
        );
        assert!(validate_remote_url("http://localhost:8080").is_ok());
        assert!(matches!(
            validate_remote_url("ftp://qa.example.org"),
            Err(StoreError::InvalidUrl { .. })
        ));
        assert!(validate_remote_url("qa.example.org").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let settings = Settings {
            timeout_ms: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_sanitized_keeps_valid_values() {
        let settings = Settings {
            remote_app_url: Some("  https://qa.example.org ".to_string()),
            timeout_ms: 1_500,
            ..Settings::default()
        }
        .sanitized();

        assert_eq!(settings.remote_app_url.as_deref(), Some("https://qa.example.org"));
        assert_eq!(settings.timeout_ms, 1_500);
        settings.validate().unwrap();
    }

    #[test]
    fn test_sanitized_drops_invalid_values() {
        let settings = Settings {
            remote_app_url: Some("ftp://qa.example.org".to_string()),
            timeout_ms: 0,
            ..Settings::default()
        }
        .sanitized();

        assert!(settings.remote_app_url.is_none());
        assert_eq!(settings.timeout_ms, Settings::default().timeout_ms);
        settings.validate().unwrap();
    }

    #[test]
    fn test_settings_serde_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"native": true}"#).unwrap();
        assert!(settings.native);
        assert_eq!(settings.timeout_ms, 20_000);
        assert_eq!(settings.log_level, LogLevel::Warn);
    }
}
