//! Errors surfaced to HTTP clients.
//!
//! Every failure is rendered with the same body shape:
//!
//! ```json
//! {"error": "NoRuleForPath", "message": "No matching rule found for path: /x", "status": 500}
//! ```

use crate::config::ConfigError;
use crate::expression::EvaluationError;
use crate::matcher::MatchError;
use hyper::StatusCode;
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// Request body is not valid JSON.
    #[error("Request body is not valid JSON: {0}")]
    Syntax(String),
    #[error("No matching rule found for path: {0}")]
    NoRuleForPath(String),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("No matching rule found for request (sequence: {0})")]
    NoRuleForSequence(u64),
    /// The rendered template did not parse as JSON.
    #[error("Rendered template is not valid JSON: {0}")]
    TemplateOutputNotJson(String),
    #[error("{0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Cannot {method} {path}")]
    NotFound { method: String, path: String },
}

impl From<MatchError> for MockError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::NoRuleForPath(path) => MockError::NoRuleForPath(path),
            MatchError::NoRuleForSequence(n) => MockError::NoRuleForSequence(n),
            MatchError::Evaluation(e) => MockError::Evaluation(e),
        }
    }
}

impl MockError {
    pub fn status(&self) -> StatusCode {
        match self {
            MockError::Syntax(_) | MockError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            MockError::NotFound { .. } => StatusCode::NOT_FOUND,
            MockError::NoRuleForPath(_)
            | MockError::Evaluation(_)
            | MockError::NoRuleForSequence(_)
            | MockError::TemplateOutputNotJson(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MockError::Syntax(_) => "SyntaxError",
            MockError::NoRuleForPath(_) => "NoRuleForPath",
            MockError::Evaluation(_) => "EvaluationError",
            MockError::NoRuleForSequence(_) => "NoRuleForSequence",
            MockError::TemplateOutputNotJson(_) => "TemplateOutputNotJSON",
            MockError::InvalidConfig(_) => "InvalidConfig",
            MockError::NotFound { .. } => "Not Found",
        }
    }

    /// `{error, message, status}`
    pub fn to_body(&self) -> Value {
        json!({
            "error": self.name(),
            "message": self.to_string(),
            "status": self.status().as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_bodies() {
        let err = MockError::from(MatchError::NoRuleForPath("/unknown".to_string()));
        assert_eq!(
            err.to_body(),
            json!({
                "error": "NoRuleForPath",
                "message": "No matching rule found for path: /unknown",
                "status": 500
            })
        );

        let err = MockError::from(MatchError::NoRuleForSequence(2));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_body()["message"],
            "No matching rule found for request (sequence: 2)"
        );

        let err = MockError::NotFound {
            method: "PUT".to_string(),
            path: "/config".to_string(),
        };
        assert_eq!(
            err.to_body(),
            json!({"error": "Not Found", "message": "Cannot PUT /config", "status": 404})
        );
    }

    #[test]
    fn test_syntax_error() {
        let parse_err = serde_json::from_str::<Value>("not valid json").unwrap_err();
        let err = MockError::Syntax(parse_err.to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.name(), "SyntaxError");
        assert!(err.to_string().contains("is not valid JSON"));
    }

    #[test]
    fn test_evaluation_error_message_carries_expression() {
        let eval = crate::expression::evaluate(&json!({}), "body.[").unwrap_err();
        let err = MockError::from(MatchError::Evaluation(eval));
        let body = err.to_body();
        assert_eq!(body["error"], "EvaluationError");
        assert!(body["message"].as_str().unwrap().contains("body.["));
    }

    #[test]
    fn test_invalid_config_is_bad_request() {
        let err = MockError::from(ConfigError::InvalidStreaming("chunkSize"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.name(), "InvalidConfig");
    }
}
