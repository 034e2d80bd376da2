//! Runtime configuration describing the host shell.
//!
//! The native wrapper decides at startup whether requests go to the page
//! origin or to a remote app URL, and may report a fatal startup error that
//! blocks all traffic. The client receives this value once, at construction.

use serde::{Deserialize, Serialize};

/// Host shell configuration, owned by whoever boots the app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// True when running inside the native wrapper.
    pub native: bool,
    /// Remote origin requests are sent to when native.
    pub remote_app_url: Option<String>,
    /// Startup error reported by the native shell.
    pub native_error: Option<String>,
}

impl RuntimeConfig {
    /// Same-origin web context.
    pub fn web() -> Self {
        Self::default()
    }

    /// Native shell talking to `remote_app_url`.
    pub fn native(remote_app_url: impl Into<String>) -> Self {
        Self {
            native: true,
            remote_app_url: Some(remote_app_url.into()),
            native_error: None,
        }
    }

    /// Records a startup error reported by the native shell.
    #[must_use]
    pub fn with_native_error(mut self, error: impl Into<String>) -> Self {
        self.native_error = Some(error.into());
        self
    }

    /// The message every request must fail with, if requests are blocked.
    ///
    /// A startup error only blocks traffic inside the native shell.
    pub fn blocked_reason(&self) -> Option<&str> {
        if self.native {
            self.native_error.as_deref()
        } else {
            None
        }
    }

    /// Remote origin, ignoring blank values.
    pub fn remote_origin(&self) -> Option<&str> {
        self.remote_app_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_is_never_blocked() {
        let config = RuntimeConfig::web().with_native_error("bridge failed");
        assert_eq!(config.blocked_reason(), None);
    }

    #[test]
    fn test_native_error_blocks() {
        let config = RuntimeConfig::native("https://example.org").with_native_error("bridge failed");
        assert_eq!(config.blocked_reason(), Some("bridge failed"));
    }

    #[test]
    fn test_blank_remote_origin_ignored() {
        let config = RuntimeConfig::native("   ");
        assert_eq!(config.remote_origin(), None);
    }
}
