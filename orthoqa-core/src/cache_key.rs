//! Cache key derivation.
//!
//! A cache key identifies a logical request for both response caching and
//! in-flight deduplication: `{METHOD}:{resolved url}:{body as JSON}`.
//!
//! Body JSON is rendered canonically (object keys sorted at every depth), so
//! `{"a":1,"b":2}` and `{"b":2,"a":1}` collapse onto the same key. Relying on
//! `serde_json`'s map ordering alone is not enough: any crate in the build
//! graph enabling `preserve_order` switches maps to insertion order.

use serde_json::Value;

use crate::http::Method;

/// Derives the cache key for a request.
pub fn derive_cache_key(method: Method, resolved_url: &str, body: Option<&Value>) -> String {
    let body = body.map_or_else(|| "null".to_string(), canonical_json);
    format!("{}:{resolved_url}:{body}", method.as_str())
}

/// Renders `value` as compact JSON with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
