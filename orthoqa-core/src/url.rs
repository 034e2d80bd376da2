//! Request URL resolution.

use crate::config::RuntimeConfig;

/// Returns true if `path` already carries an `http://` or `https://` scheme.
pub fn is_absolute_url(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Produces the final request URL for `path`.
///
/// Absolute URLs pass through untouched. Inside the native shell the path is
/// joined onto the remote origin; everywhere else (or when no remote origin is
/// configured) the path stays relative to the page origin.
pub fn resolve_url(path: &str, runtime: &RuntimeConfig) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }
    if !runtime.native {
        return path.to_string();
    }
    let Some(base) = runtime.remote_origin() else {
        return path.to_string();
    };

    // Exactly one slash is trimmed on each side.
    let base = base.strip_suffix('/').unwrap_or(base);
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_passthrough() {
        let runtime = RuntimeConfig::native("https://qa.example.org");
        assert_eq!(
            resolve_url("https://other.example.org/api/x", &runtime),
            "https://other.example.org/api/x"
        );
        assert_eq!(
            resolve_url("HTTP://other.example.org/api/x", &runtime),
            "HTTP://other.example.org/api/x"
        );
    }

    #[test]
    fn test_web_context_stays_relative() {
        assert_eq!(resolve_url("/api/topics", &RuntimeConfig::web()), "/api/topics");
    }

    #[test]
    fn test_native_joins_remote_origin() {
        let runtime = RuntimeConfig::native("https://qa.example.org/");
        assert_eq!(
            resolve_url("/api/topics", &runtime),
            "https://qa.example.org/api/topics"
        );
        assert_eq!(
            resolve_url("api/topics", &runtime),
            "https://qa.example.org/api/topics"
        );
    }

    #[test]
    fn test_only_one_slash_trimmed() {
        let runtime = RuntimeConfig::native("https://qa.example.org//");
        assert_eq!(
            resolve_url("//api/topics", &runtime),
            "https://qa.example.org///api/topics"
        );
    }

    #[test]
    fn test_native_without_remote_falls_back() {
        let runtime = RuntimeConfig {
            native: true,
            remote_app_url: None,
            native_error: None,
        };
        assert_eq!(resolve_url("/api/topics", &runtime), "/api/topics");
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("http://a"));
        assert!(is_absolute_url("https://a/b"));
        assert!(!is_absolute_url("/api/https://"));
        assert!(!is_absolute_url("ftp://a"));
        assert!(!is_absolute_url("htt"));
    }
}
