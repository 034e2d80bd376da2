//! Error taxonomy for API requests.
//!
//! Two families of failure are kept apart on purpose:
//!
//! - **Structured** errors ([`ApiError::Status`] and
//!   [`ApiError::UnexpectedContentType`]) carry an HTTP status and a payload.
//!   The server answered, and the caller may inspect what it said.
//! - **Plain** errors carry only a message: the startup block, HTML where
//!   JSON was expected, and transport failures (timeouts, cancellation,
//!   connection errors).
//!
//! The type is `Clone` because one settled outcome is handed to every
//! deduplicated caller.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

static NULL_PAYLOAD: Value = Value::Null;

/// Error type for API requests.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The native shell reported a startup error; no request may be issued.
    #[error("{0}")]
    Blocked(String),

    /// The response declared neither a JSON nor a plain-text body.
    #[error("Unexpected response content type {} (HTTP {status})", .content_type.as_deref().unwrap_or("<none>"))]
    UnexpectedContentType {
        /// HTTP status of the offending response.
        status: u16,
        /// Declared content type, if any.
        content_type: Option<String>,
    },

    /// A plain-text response turned out to be an HTML page.
    #[error("Server returned an HTML page instead of JSON (HTTP {status}); the request may have been intercepted")]
    HtmlResponse {
        /// HTTP status of the offending response.
        status: u16,
    },

    /// The server answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status.
        status: u16,
        /// Human-readable message.
        message: String,
        /// Parsed response body.
        payload: Value,
    },

    /// The attempt ran past its timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// The transport failed before a response was received.
    #[error("Network error: {0}")]
    Transport(String),

    /// A response body could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The request body could not be encoded.
    #[error("Failed to encode request body: {0}")]
    Serialize(String),
}

impl ApiError {
    /// Builds a [`ApiError::Status`], taking the message from the payload when it has one.
    pub fn from_status(status: u16, payload: Value) -> Self {
        let message = payload_message(&payload)
            .unwrap_or_else(|| format!("Request failed with status {status}"));
        Self::Status {
            status,
            message,
            payload,
        }
    }

    /// HTTP status carried by structured errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::UnexpectedContentType { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Payload carried by structured errors (`null` for content-type violations).
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Status { payload, .. } => Some(payload),
            Self::UnexpectedContentType { .. } => Some(&NULL_PAYLOAD),
            _ => None,
        }
    }

    /// True when the server answered and the error carries status and payload.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::UnexpectedContentType { .. }
        )
    }

    /// True for failures raised below HTTP (timeouts, cancellation, network).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Cancelled | Self::Transport(_))
    }

    /// Field-level validation messages at `payload.errors.<field>`.
    pub fn field_errors(&self, field: &str) -> Vec<String> {
        self.payload()
            .and_then(|p| p.get("errors"))
            .and_then(|errors| errors.get(field))
            .map(|value| match value {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
                Value::String(s) => vec![s.clone()],
                _ => Vec::new(),
            })
            .unwrap_or_default()
    }
}

fn payload_message(payload: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|field| payload.get(field).and_then(Value::as_str))
        .filter(|msg| !msg.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_message_from_payload() {
        let err = ApiError::from_status(403, json!({"message": "Forbidden area"}));
        assert_eq!(err.to_string(), "Forbidden area");

        let err = ApiError::from_status(404, json!({"error": "No such topic"}));
        assert_eq!(err.to_string(), "No such topic");
    }

    #[test]
    fn test_status_message_fallback() {
        let err = ApiError::from_status(500, Value::Null);
        assert_eq!(err.to_string(), "Request failed with status 500");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_structured_vs_plain() {
        let content = ApiError::UnexpectedContentType {
            status: 200,
            content_type: Some("text/html".to_string()),
        };
        assert!(content.is_structured());
        assert_eq!(content.payload(), Some(&Value::Null));

        let html = ApiError::HtmlResponse { status: 200 };
        assert!(!html.is_structured());
        assert_eq!(html.status(), None);

        assert!(!ApiError::Blocked("x".to_string()).is_structured());
        assert!(ApiError::Timeout(Duration::from_secs(1)).is_transport());
    }

    #[test]
    fn test_field_errors() {
        let err = ApiError::from_status(
            422,
            json!({"errors": {"question": ["required"], "email": "invalid"}}),
        );
        assert_eq!(err.field_errors("question"), vec!["required".to_string()]);
        assert_eq!(err.field_errors("email"), vec!["invalid".to_string()]);
        assert!(err.field_errors("name").is_empty());
    }
}
