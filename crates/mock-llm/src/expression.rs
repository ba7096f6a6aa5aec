//! JMESPath evaluation for rule predicates and template directives.
//!
//! Expressions are evaluated against plain `serde_json::Value` data and
//! produce `serde_json::Value` results, so callers never see the query
//! library's own variable type.
//!
//! # Supported syntax
//!
//! Everything the JMESPath grammar offers, most commonly:
//!
//! - `body.model` - field access
//! - `body.messages[-1].content` - indexing, negative indices count from the end
//! - `contains(body.messages[0].content || '', 'agent-a')` - functions and `||`
//! - `body.messages[*].role` - projections
//! - `@` - the whole input

use serde_json::Value;

/// Expression used when a rule has no `match` field.
pub const MATCH_ALL: &str = "@";

/// A malformed expression or a runtime failure (e.g. a type error in a function call).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Error evaluating expression '{expression}': {reason}")]
pub struct EvaluationError {
    /// The raw expression text as written in the configuration.
    pub expression: String,
    /// Diagnostic produced by the parser or interpreter.
    pub reason: String,
}

impl EvaluationError {
    fn new(expression: &str, reason: impl ToString) -> Self {
        Self {
            expression: expression.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Evaluate `expression` against `data`.
pub fn evaluate(data: &Value, expression: &str) -> Result<Value, EvaluationError> {
    let compiled =
        jmespath::compile(expression).map_err(|e| EvaluationError::new(expression, e))?;
    let result = compiled
        .search(data)
        .map_err(|e| EvaluationError::new(expression, e))?;
    serde_json::to_value(&*result).map_err(|e| EvaluationError::new(expression, e))
}

/// Truthiness used to decide whether a rule's predicate matched.
///
/// `null`, `false`, zero, the empty string and empty arrays/objects are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Evaluate `expression` and report whether the result is truthy.
pub fn matches(data: &Value, expression: &str) -> Result<bool, EvaluationError> {
    evaluate(data, expression).map(|v| is_truthy(&v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> Value {
        json!({
            "body": {
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "You are agent-a"},
                    {"role": "user", "content": "weather in NYC"}
                ]
            },
            "headers": {"authorization": "Bearer test-key-123"},
            "method": "POST",
            "path": "/v1/chat/completions",
            "query": {}
        })
    }

    #[test]
    fn test_field_access() {
        assert_eq!(evaluate(&request(), "body.model").unwrap(), json!("gpt-4"));
        assert_eq!(evaluate(&request(), "method").unwrap(), json!("POST"));
    }

    #[test]
    fn test_negative_index() {
        assert_eq!(
            evaluate(&request(), "body.messages[-1].content").unwrap(),
            json!("weather in NYC")
        );
    }

    #[test]
    fn test_projection() {
        assert_eq!(
            evaluate(&request(), "body.messages[*].role").unwrap(),
            json!(["system", "user"])
        );
    }

    #[test]
    fn test_contains_with_or_default() {
        let data = request();
        assert!(matches(&data, "contains(body.messages[0].content || '', 'agent-a')").unwrap());
        assert!(!matches(&data, "contains(body.messages[0].content || '', 'agent-b')").unwrap());

        let empty = json!({"body": {}});
        assert!(!matches(&empty, "contains(body.messages[0].content || '', 'agent-a')").unwrap());
    }

    #[test]
    fn test_identity_matches_any_object() {
        assert!(matches(&request(), MATCH_ALL).unwrap());
        assert_eq!(evaluate(&json!({"a": "b"}), "@").unwrap(), json!({"a": "b"}));
    }

    #[test]
    fn test_missing_field_is_null() {
        assert_eq!(evaluate(&request(), "headers.nonexistent").unwrap(), Value::Null);
        assert!(!matches(&request(), "headers.nonexistent").unwrap());
    }

    #[test]
    fn test_malformed_expression_carries_text() {
        let err = evaluate(&request(), "body.[").unwrap_err();
        assert_eq!(err.expression, "body.[");
        assert!(!err.reason.is_empty());
        assert!(err.to_string().contains("body.["));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));

        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!(-2.5)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([0])));
        assert!(is_truthy(&json!({"k": null})));
    }
}
