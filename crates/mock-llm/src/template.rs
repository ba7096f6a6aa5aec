//! Response body templating with request data.
//!
//! Rule responses are JSON-shaped template strings. Two directives are
//! recognised, both delimited by double braces:
//!
//! - `{{timestamp}}` - the current time in epoch milliseconds
//! - `{{jmes <key> <expression>}}` - a JMESPath query against `context[key]`
//!
//! Objects and arrays produced by a `jmes` directive are substituted as JSON,
//! unquoted; everything else is substituted as plain text (`null` for missing
//! values). The renderer never re-scans what it substituted.
//!
//! # Example
//!
//! ```yaml
//! response:
//!   status: 200
//!   content: '{"model": "{{jmes request body.model}}", "echo": {{jmes request body.messages[0]}}}'
//! ```

use crate::expression::{evaluate, EvaluationError};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

static TIMESTAMP_REGEX: OnceLock<Regex> = OnceLock::new();
static JMES_REGEX: OnceLock<Regex> = OnceLock::new();

fn timestamp_regex() -> &'static Regex {
    TIMESTAMP_REGEX.get_or_init(|| Regex::new(r"\{\{timestamp\}\}").unwrap())
}

/// Matches `{{jmes request body.model}}`: capture 1 is the context key,
/// capture 2 the expression (which cannot contain `}`).
fn jmes_directive_regex() -> &'static Regex {
    JMES_REGEX.get_or_init(|| Regex::new(r"\{\{jmes\s+(\w+)\s+([^}]+)\}\}").unwrap())
}

/// Values the directives can reference, keyed by name (`request`).
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    values: HashMap<String, Value>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value to the context.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Render a template string against the context.
///
/// Timestamps are substituted first, then `jmes` directives, each in a single
/// pass over the input. The first failing expression aborts the render.
pub fn render(template: &str, context: &RenderContext) -> Result<String, EvaluationError> {
    let with_timestamps = timestamp_regex().replace_all(template, |_: &Captures| {
        chrono::Utc::now().timestamp_millis().to_string()
    });

    let mut failure = None;
    let rendered = jmes_directive_regex().replace_all(&with_timestamps, |caps: &Captures| {
        if failure.is_some() {
            return String::new();
        }
        let data = context.get(&caps[1]).unwrap_or(&Value::Null);
        match evaluate(data, caps[2].trim()) {
            Ok(value) => substitution(&value),
            Err(e) => {
                failure = Some(e);
                String::new()
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(rendered.into_owned()),
    }
}

/// Text substituted for a directive result.
fn substitution(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => value.to_string(),
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}
