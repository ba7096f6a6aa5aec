//! The normalized request view exposed to rule predicates and templates.
//!
//! Every inbound request is reduced to
//! `{body, headers, method, path, query}` before any rule is evaluated:
//!
//! - `body` - the parsed JSON body, or `{}` when the request has no body
//! - `headers` - header values keyed by lower-cased name
//! - `method` - the upper-case HTTP verb
//! - `path` - the URL path without the query string
//! - `query` - percent-decoded query parameters

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Parsed request data for rule matching and template rendering
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    /// Parsed JSON body (`{}` for empty bodies)
    pub body: Value,
    /// Request headers (keys lowercased)
    pub headers: BTreeMap<String, String>,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path (without query string)
    pub path: String,
    /// Query parameters parsed from the URL
    pub query: BTreeMap<String, String>,
}

impl RequestView {
    /// Create a RequestView from request components.
    ///
    /// The body must already be parsed; use [`parse_body`] for raw bytes.
    pub fn new(
        method: &str,
        path: &str,
        query_string: Option<&str>,
        headers: &hyper::HeaderMap,
        body: Value,
    ) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|val| (k.as_str().to_lowercase(), val.to_string()))
            })
            .collect();

        Self {
            body,
            headers,
            method: method.to_uppercase(),
            path: path.to_string(),
            query: parse_query_string(query_string),
        }
    }

    /// Whether the client asked for a streamed completion (`"stream": true`).
    pub fn wants_stream(&self) -> bool {
        self.body.get("stream").and_then(Value::as_bool) == Some(true)
    }

    /// The view as a JSON value, the shape predicates and templates query.
    pub fn to_value(&self) -> Value {
        let headers = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<_, _>>();
        let query = self
            .query
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<_, _>>();

        let mut view = Map::new();
        view.insert("body".to_string(), self.body.clone());
        view.insert("headers".to_string(), Value::Object(headers));
        view.insert("method".to_string(), Value::String(self.method.clone()));
        view.insert("path".to_string(), Value::String(self.path.clone()));
        view.insert("query".to_string(), Value::Object(query));
        Value::Object(view)
    }
}

/// Parse a raw request body into the view's `body` value.
///
/// Empty (or whitespace-only) bodies become `{}` so expressions like
/// `body.model` stay total on GET requests.
pub fn parse_body(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}

/// Parse query string into a map. Repeated keys keep the first value.
pub fn parse_query_string(query: Option<&str>) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    if let Some(q) = query {
        for pair in q.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                let decoded = decode_component(value);
                params.entry(decode_component(key)).or_insert(decoded);
            } else if !pair.is_empty() {
                params
                    .entry(decode_component(pair))
                    .or_insert_with(String::new);
            }
        }
    }
    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}
