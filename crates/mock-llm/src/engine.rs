//! Request handling for rule-governed routes: select, render, and decide
//! between a JSON body and an event stream.

use crate::error::MockError;
use crate::request::RequestView;
use crate::state::ConfigStore;
use crate::streaming::StreamPlan;
use crate::template::{render, RenderContext};
use serde_json::Value;
use tracing::debug;

/// How a matched request is answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Json { status: u16, body: Value },
    Stream(StreamPlan),
}

pub fn handle(store: &ConfigStore, view: &RequestView) -> Result<Outcome, MockError> {
    let rule = store.select(view)?;
    debug!(
        "Matched rule for {} {} (match: {})",
        view.method,
        view.path,
        rule.match_expression()
    );

    let context = RenderContext::new().with("request", view.to_value());
    let rendered = render(&rule.response.content, &context)?;
    let body: Value = serde_json::from_str(&rendered)
        .map_err(|e| MockError::TemplateOutputNotJson(e.to_string()))?;
    let status = rule.response.status;

    if view.wants_stream() && body.is_object() {
        return Ok(Outcome::Stream(StreamPlan::new(
            &body,
            status,
            &store.streaming(),
        )));
    }
    Ok(Outcome::Json { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use hyper::HeaderMap;
    use serde_json::json;

    fn store(rules: Value) -> ConfigStore {
        let config: Config = serde_json::from_value(json!({ "rules": rules })).unwrap();
        ConfigStore::new(config).unwrap()
    }

    fn post(body: Value) -> RequestView {
        RequestView::new("POST", "/v1/chat/completions", None, &HeaderMap::new(), body)
    }

    #[test]
    fn test_default_config_echoes_last_message() {
        let store = ConfigStore::new(Config::default()).unwrap();
        let view = post(json!({
            "model": "gpt-4",
            "messages": [{"role": "user", "content": "Hello"}]
        }));

        let Outcome::Json { status, body } = handle(&store, &view).unwrap() else {
            panic!("expected a JSON outcome");
        };
        assert_eq!(status, 200);
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["object"], "chat.completion");
        assert_eq!(body["choices"][0]["message"]["content"], "Hello");
        assert!(body["id"].as_str().unwrap().starts_with("chatcmpl-"));
    }

    #[test]
    fn test_default_models_listing() {
        let store = ConfigStore::new(Config::default()).unwrap();
        let view = RequestView::new("GET", "/v1/models", None, &HeaderMap::new(), json!({}));
        let Outcome::Json { body, .. } = handle(&store, &view).unwrap() else {
            panic!("expected a JSON outcome");
        };
        assert_eq!(body["data"][0]["id"], "gpt-5.2");
    }

    #[test]
    fn test_rule_status_is_used() {
        let store = store(json!([
            {"path": "/v1/chat/completions",
             "response": {"status": 429, "content": "{\"error\": {\"message\": \"Rate limit exceeded\"}}"}}
        ]));
        let outcome = handle(&store, &post(json!({}))).unwrap();
        assert_eq!(
            outcome,
            Outcome::Json {
                status: 429,
                body: json!({"error": {"message": "Rate limit exceeded"}})
            }
        );
    }

    #[test]
    fn test_stream_requested() {
        let store = store(json!([
            {"path": "/v1/chat/completions",
             "response": {"status": 200, "content": "{\"choices\": [{\"message\": {\"content\": \"{{jmes request body.model}}\"}}]}"}}
        ]));
        let outcome = handle(&store, &post(json!({"model": "abc", "stream": true}))).unwrap();
        let Outcome::Stream(plan) = outcome else {
            panic!("expected a stream outcome");
        };
        let payloads = plan.payloads();
        assert_eq!(payloads.len(), 2);
        let first: Value = serde_json::from_str(&payloads[0]).unwrap();
        assert_eq!(first["choices"][0]["delta"]["content"], "abc");
    }

    #[test]
    fn test_rendered_key_order_is_kept() {
        let store = store(json!([
            {"path": "/v1/chat/completions",
             "response": {"status": 429, "content": "{\"type\": \"rate\", \"error\": \"x\"}"}}
        ]));

        let Outcome::Json { body, .. } = handle(&store, &post(json!({}))).unwrap() else {
            panic!("expected a JSON outcome");
        };
        assert_eq!(body.to_string(), r#"{"type":"rate","error":"x"}"#);

        let Outcome::Stream(plan) = handle(&store, &post(json!({"stream": true}))).unwrap() else {
            panic!("expected a stream outcome");
        };
        assert_eq!(plan.payloads(), vec![r#"{"type":"rate","error":"x"}"#.to_string()]);
    }

    #[test]
    fn test_stream_with_non_object_payload_is_json() {
        let store = store(json!([
            {"path": "/v1/chat/completions", "response": {"status": 200, "content": "[1, 2]"}}
        ]));
        let outcome = handle(&store, &post(json!({"stream": true}))).unwrap();
        assert!(matches!(outcome, Outcome::Json { .. }));
    }

    #[test]
    fn test_template_output_not_json() {
        let store = store(json!([
            {"path": "/v1/chat/completions", "response": {"status": 200, "content": "{\"invalid\": {{unclosed}}"}}
        ]));
        let err = handle(&store, &post(json!({}))).unwrap_err();
        assert!(matches!(err, MockError::TemplateOutputNotJson(_)));
        assert_eq!(err.name(), "TemplateOutputNotJSON");
    }

    #[test]
    fn test_template_evaluation_error() {
        let store = store(json!([
            {"path": "/v1/chat/completions", "response": {"status": 200, "content": "{{jmes request body.[}}"}}
        ]));
        let err = handle(&store, &post(json!({}))).unwrap_err();
        assert!(matches!(err, MockError::Evaluation(_)));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let store = store(json!([
            {"path": "/v1/chat/completions",
             "response": {"status": 200, "content": "{\"echo\": {{jmes request body.messages}}}"}}
        ]));
        let view = post(json!({"messages": [{"role": "user", "content": "x"}]}));
        assert_eq!(handle(&store, &view).unwrap(), handle(&store, &view).unwrap());
    }
}
