//! Response validation and body parsing.
//!
//! Reverse proxies and anti-bot walls like to answer API calls with an HTML
//! challenge page, often with status 200. Two checks keep such pages from
//! being mistaken for data:
//!
//! 1. The content-type gate runs before the body is touched. Anything that is
//!    neither `application/json` nor `text/plain` is rejected outright.
//! 2. Plain-text bodies are sniffed for HTML markers, which catches challenge
//!    pages served with a mislabeled content type.

use orthoqa_core::{ApiError, HttpResponse};
use serde_json::Value;

/// How a response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `application/json`.
    Json,
    /// `text/plain`.
    Text,
}

/// Classifies a declared content type. `None` means the gate rejects it.
pub fn classify_content_type(content_type: Option<&str>) -> Option<BodyKind> {
    let content_type = content_type?.to_ascii_lowercase();
    if content_type.contains("application/json") {
        Some(BodyKind::Json)
    } else if content_type.contains("text/plain") {
        Some(BodyKind::Text)
    } else {
        None
    }
}

/// Heuristic check for an HTML document.
pub fn looks_like_html(text: &str) -> bool {
    let trimmed = text.trim_start();
    // `<!DOCTYPE` is covered by the leading `<` check.
    trimmed.starts_with('<') || text.to_ascii_lowercase().contains("<html")
}

/// Validates `response` and decodes its body, whatever its status.
///
/// JSON bodies are parsed (an empty body reads as `null`); plain-text bodies
/// become a JSON string.
///
/// # Errors
///
/// - [`ApiError::UnexpectedContentType`] when the content-type gate rejects the response
/// - [`ApiError::HtmlResponse`] when a plain-text body is an HTML page
/// - [`ApiError::Decode`] when a JSON body does not parse
pub fn parse_body(response: &HttpResponse) -> Result<Value, ApiError> {
    let Some(kind) = classify_content_type(response.content_type()) else {
        return Err(ApiError::UnexpectedContentType {
            status: response.status,
            content_type: response.content_type().map(str::to_string),
        });
    };

    match kind {
        BodyKind::Json => {
            if response.body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
        }
        BodyKind::Text => {
            let text = String::from_utf8_lossy(&response.body);
            if looks_like_html(&text) {
                return Err(ApiError::HtmlResponse {
                    status: response.status,
                });
            }
            Ok(Value::String(text.into_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_type_classification() {
        assert_eq!(
            classify_content_type(Some("application/json; charset=utf-8")),
            Some(BodyKind::Json)
        );
        assert_eq!(classify_content_type(Some("Application/JSON")), Some(BodyKind::Json));
        assert_eq!(classify_content_type(Some("text/plain")), Some(BodyKind::Text));
        assert_eq!(classify_content_type(Some("text/html; charset=utf-8")), None);
        assert_eq!(classify_content_type(None), None);
    }

    #[test]
    fn test_html_gate_on_success_status() {
        let response = HttpResponse::new(200, "text/html", "{\"looks\":\"like json\"}");
        let err = parse_body(&response).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedContentType { status: 200, .. }));
        assert!(err.is_structured());
        assert_eq!(err.payload(), Some(&Value::Null));
    }

    #[test]
    fn test_missing_content_type_rejected() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: b"{}".to_vec(),
        };
        let err = parse_body(&response).unwrap_err();
        assert!(matches!(
            err,
            ApiError::UnexpectedContentType {
                content_type: None,
                ..
            }
        ));
    }

    #[test]
    fn test_html_sniffing() {
        assert!(looks_like_html("<!DOCTYPE html><html></html>"));
        assert!(looks_like_html("   \n<div>challenge</div>"));
        assert!(looks_like_html("Please wait... <HTML> redirect"));
        assert!(!looks_like_html("plain message"));
        assert!(!looks_like_html("a < b"));

        let response = HttpResponse::new(200, "text/plain", "<!DOCTYPE html><title>Just a moment</title>");
        let err = parse_body(&response).unwrap_err();
        assert!(matches!(err, ApiError::HtmlResponse { status: 200 }));
        assert!(!err.is_structured());
    }

    #[test]
    fn test_plain_text_payload() {
        let response = HttpResponse::new(503, "text/plain; charset=utf-8", "maintenance");
        assert_eq!(parse_body(&response).unwrap(), json!("maintenance"));
    }

    #[test]
    fn test_json_parsing() {
        let response = HttpResponse::json(200, &json!({"topics": ["fasting"]}));
        assert_eq!(parse_body(&response).unwrap(), json!({"topics": ["fasting"]}));

        let empty = HttpResponse::new(200, "application/json", "");
        assert_eq!(parse_body(&empty).unwrap(), Value::Null);

        let broken = HttpResponse::new(200, "application/json", "{not json");
        assert!(matches!(parse_body(&broken), Err(ApiError::Decode(_))));
    }
}
