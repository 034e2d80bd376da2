//! Output formatting for CLI.

use anyhow::Result;
use orthoqa_core::ApiError;
use serde::Serialize;

/// JSON output formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Prints a value to stdout.
    pub fn print<T: Serialize>(&self, data: &T) -> Result<()> {
        println!("{}", self.format(data)?);
        Ok(())
    }
}

/// Renders an API error for stderr.
///
/// Structured errors show the status and the server payload beneath the message.
pub fn describe_api_error(err: &ApiError) -> String {
    let mut out = format!("Error: {err}");
    if let Some(status) = err.status() {
        out.push_str(&format!("\nStatus: {status}"));
    }
    if let Some(payload) = err.payload().filter(|p| !p.is_null()) {
        let payload = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
        out.push_str(&format!("\nPayload: {payload}"));
    }
    out
}

/// Prints a command failure to stderr.
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<ApiError>() {
        Some(api) => eprintln!("{}", describe_api_error(api)),
        None => eprintln!("Error: {err:#}"),
    }
}
