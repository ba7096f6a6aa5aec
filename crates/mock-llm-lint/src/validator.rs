//! Core validation logic for mock-llm configurations.

use crate::types::{LintIssue, LintOptions, LintResult};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

const KNOWN_METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE", "CONNECT",
];

static TIMESTAMP_DIRECTIVE: OnceLock<Regex> = OnceLock::new();
static JMES_DIRECTIVE: OnceLock<Regex> = OnceLock::new();

fn timestamp_directive() -> &'static Regex {
    TIMESTAMP_DIRECTIVE.get_or_init(|| Regex::new(r"\{\{timestamp\}\}").unwrap())
}

fn jmes_directive() -> &'static Regex {
    JMES_DIRECTIVE.get_or_init(|| Regex::new(r"\{\{jmes\s+(\w+)\s+([^}]+)\}\}").unwrap())
}

/// Validate a complete configuration document.
pub fn validate_config(
    file: &Path,
    config: &Value,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let Some(doc) = config.as_object() else {
        result.add_issue(
            LintIssue::error("E003", "Configuration must be a mapping", file)
                .with_suggestion("Start the file with `rules:`"),
        );
        return;
    };

    if let Some(streaming) = doc.get("streaming") {
        validate_streaming(file, streaming, result);
    }

    let Some(rules) = doc.get("rules") else {
        result.add_issue(
            LintIssue::error("E003", "Missing required field: rules", file)
                .with_suggestion("Add a `rules:` list"),
        );
        return;
    };
    let Some(rules) = rules.as_array() else {
        result.add_issue(
            LintIssue::error("E003", "`rules` must be a list", file).with_location("rules"),
        );
        return;
    };

    for (idx, rule) in rules.iter().enumerate() {
        validate_rule(file, rule, idx, result, options);
    }
    check_sequences(file, rules, result);
    if options.report_shadowing {
        check_shadowing(file, rules, result);
    }
}

/// Validate the `streaming` block.
pub fn validate_streaming(file: &Path, streaming: &Value, result: &mut LintResult) {
    let Some(fields) = streaming.as_object() else {
        result.add_issue(
            LintIssue::error("E009", "`streaming` must be a mapping", file)
                .with_location("streaming"),
        );
        return;
    };

    for key in ["chunkSize", "chunkIntervalMs"] {
        if let Some(value) = fields.get(key) {
            if !value.as_u64().is_some_and(|n| n > 0) {
                result.add_issue(
                    LintIssue::error(
                        "E009",
                        format!("streaming.{key} must be a positive integer, got {value}"),
                        file,
                    )
                    .with_location(format!("streaming.{key}")),
                );
            }
        }
    }
}

/// Validate a single rule.
pub fn validate_rule(
    file: &Path,
    rule: &Value,
    idx: usize,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let location = format!("rules[{idx}]");
    let Some(fields) = rule.as_object() else {
        result.add_issue(
            LintIssue::error("E004", "Rule must be a mapping", file).with_location(location),
        );
        return;
    };

    match fields.get("path") {
        Some(Value::String(path)) => validate_path(file, path, &location, result),
        Some(_) => result.add_issue(
            LintIssue::error("E004", "`path` must be a string", file)
                .with_location(format!("{location}.path")),
        ),
        None => result.add_issue(
            LintIssue::error("E004", "Rule is missing `path`", file)
                .with_location(location.clone())
                .with_suggestion("Add a path regex such as /v1/chat/completions"),
        ),
    }

    if let Some(method) = fields.get("method") {
        validate_method(file, method, &location, result);
    }

    if let Some(expr) = fields.get("match") {
        match expr.as_str() {
            Some(expr) => validate_match(file, expr, &location, result),
            None => result.add_issue(
                LintIssue::error("E006", "`match` must be a string expression", file)
                    .with_location(format!("{location}.match")),
            ),
        }
    }

    if let Some(sequence) = fields.get("sequence") {
        if sequence.as_u64().is_none() {
            result.add_issue(
                LintIssue::error(
                    "E004",
                    format!("`sequence` must be a non-negative integer, got {sequence}"),
                    file,
                )
                .with_location(format!("{location}.sequence")),
            );
        }
    }

    match fields.get("response") {
        Some(response) => validate_response(file, response, &location, result, options),
        None => result.add_issue(
            LintIssue::error("E004", "Rule is missing `response`", file)
                .with_location(location)
                .with_suggestion("Add `response: {status: 200, content: '...'}`"),
        ),
    }
}

fn validate_path(file: &Path, path: &str, location: &str, result: &mut LintResult) {
    if let Err(e) = Regex::new(path) {
        result.add_issue(
            LintIssue::error("E005", format!("Invalid path regex '{path}': {e}"), file)
                .with_location(format!("{location}.path"))
                .with_suggestion("Escape regex metacharacters such as ( [ ? with a backslash"),
        );
    }
}

fn validate_method(file: &Path, method: &Value, location: &str, result: &mut LintResult) {
    let Some(method) = method.as_str() else {
        result.add_issue(
            LintIssue::error("E004", "`method` must be a string", file)
                .with_location(format!("{location}.method")),
        );
        return;
    };
    if !KNOWN_METHODS.contains(&method.to_ascii_uppercase().as_str()) {
        result.add_issue(
            LintIssue::warning("W003", format!("Unknown HTTP method '{method}'"), file)
                .with_location(format!("{location}.method"))
                .with_suggestion(format!("Use one of {}", KNOWN_METHODS.join(", "))),
        );
    }
}

fn validate_match(file: &Path, expr: &str, location: &str, result: &mut LintResult) {
    if let Err(e) = jmespath::compile(expr) {
        result.add_issue(
            LintIssue::error("E006", format!("Invalid match expression '{expr}': {e}"), file)
                .with_location(format!("{location}.match")),
        );
    }
}

/// Validate a rule's `response` block and its template.
pub fn validate_response(
    file: &Path,
    response: &Value,
    location: &str,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let location = format!("{location}.response");
    let Some(fields) = response.as_object() else {
        result.add_issue(
            LintIssue::error("E004", "`response` must be a mapping", file).with_location(location),
        );
        return;
    };

    match fields.get("status") {
        Some(status) if status.as_u64().is_some_and(|s| (100..=999).contains(&s)) => {}
        Some(status) => result.add_issue(
            LintIssue::error("E008", format!("Invalid status code {status}"), file)
                .with_location(format!("{location}.status"))
                .with_suggestion("Use an HTTP status between 100 and 999"),
        ),
        None => result.add_issue(
            LintIssue::error("E004", "Response is missing `status`", file)
                .with_location(location.clone()),
        ),
    }

    match fields.get("content") {
        Some(Value::String(template)) => {
            validate_template(file, template, &location, result, options)
        }
        Some(_) => result.add_issue(
            LintIssue::error("E004", "`content` must be a template string", file)
                .with_location(format!("{location}.content"))
                .with_suggestion("Quote the JSON body so it is kept as a string"),
        ),
        None => result.add_issue(
            LintIssue::error("E004", "Response is missing `content`", file)
                .with_location(location),
        ),
    }
}

/// Check `jmes` directives compile and the template forms JSON once rendered.
pub fn validate_template(
    file: &Path,
    template: &str,
    location: &str,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let location = format!("{location}.content");
    for caps in jmes_directive().captures_iter(template) {
        let expr = caps[2].trim();
        if let Err(e) = jmespath::compile(expr) {
            result.add_issue(
                LintIssue::error("E007", format!("Invalid template expression '{expr}': {e}"), file)
                    .with_location(location.clone()),
            );
        }
    }

    if options.check_template_json {
        let stubbed = timestamp_directive().replace_all(template, "0");
        let stubbed = jmes_directive().replace_all(&stubbed, "0");
        if let Err(e) = serde_json::from_str::<Value>(&stubbed) {
            result.add_issue(
                LintIssue::warning(
                    "W001",
                    format!("Template does not form JSON once rendered: {e}"),
                    file,
                )
                .with_location(location),
            );
        }
    }
}

fn rule_str<'a>(rule: &'a Value, key: &str) -> Option<&'a str> {
    rule.get(key).and_then(Value::as_str)
}

fn has_match(rule: &Map<String, Value>) -> bool {
    rule.get("match")
        .and_then(Value::as_str)
        .is_some_and(|m| m.trim() != "@")
}

/// W002 gaps and W004 duplicates among sequence-gated rules on the same path.
fn check_sequences(file: &Path, rules: &[Value], result: &mut LintResult) {
    let mut by_path: BTreeMap<&str, BTreeSet<u64>> = BTreeMap::new();
    let mut unconditional: BTreeMap<(&str, String, u64), usize> = BTreeMap::new();

    for (idx, rule) in rules.iter().enumerate() {
        let (Some(fields), Some(path)) = (rule.as_object(), rule_str(rule, "path")) else {
            continue;
        };
        let Some(seq) = fields.get("sequence").and_then(Value::as_u64) else {
            continue;
        };
        by_path.entry(path).or_default().insert(seq);

        if has_match(fields) {
            continue;
        }
        let method = rule_str(rule, "method")
            .map(str::to_ascii_uppercase)
            .unwrap_or_default();
        if let Some(first) = unconditional.insert((path, method, seq), idx) {
            result.add_issue(
                LintIssue::warning(
                    "W004",
                    format!("Sequence {seq} on '{path}' is already answered by rules[{first}]"),
                    file,
                )
                .with_location(format!("rules[{idx}].sequence"))
                .with_suggestion("Add a `match` expression to tell the rules apart"),
            );
        }
    }

    for (path, seqs) in by_path {
        let Some(&max) = seqs.iter().next_back() else {
            continue;
        };
        let missing: Vec<String> = (0..max)
            .filter(|n| !seqs.contains(n))
            .map(|n| n.to_string())
            .collect();
        if !missing.is_empty() {
            result.add_issue(
                LintIssue::warning(
                    "W002",
                    format!(
                        "Sequence on '{path}' has no rule for position(s) {}; later positions are unreachable",
                        missing.join(", ")
                    ),
                    file,
                )
                .with_suggestion("Sequence positions start at 0 and advance by one"),
            );
        }
    }
}

/// I001: a later unconditional rule on the same path hides earlier ones.
fn check_shadowing(file: &Path, rules: &[Value], result: &mut LintResult) {
    for (later_idx, later) in rules.iter().enumerate() {
        let Some(fields) = later.as_object() else {
            continue;
        };
        if has_match(fields) || fields.contains_key("sequence") {
            continue;
        }
        let Some(path) = rule_str(later, "path") else {
            continue;
        };
        let later_method = rule_str(later, "method").map(str::to_ascii_uppercase);

        for (idx, earlier) in rules[..later_idx].iter().enumerate() {
            if rule_str(earlier, "path") != Some(path) || earlier.get("sequence").is_some() {
                continue;
            }
            let earlier_method = rule_str(earlier, "method").map(str::to_ascii_uppercase);
            let covered = match (&later_method, &earlier_method) {
                (None, _) => true,
                (Some(l), Some(e)) => l == e,
                (Some(_), None) => false,
            };
            if covered {
                result.add_issue(
                    LintIssue::info(
                        "I001",
                        format!("Rule is never selected: rules[{later_idx}] matches every request it would"),
                        file,
                    )
                    .with_location(format!("rules[{idx}]"))
                    .with_suggestion("The last matching rule wins; move catch-all rules first"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lint(config: Value) -> LintResult {
        let mut result = LintResult::new();
        validate_config(Path::new("test.yaml"), &config, &mut result, &LintOptions::default());
        result
    }

    fn codes(result: &LintResult) -> Vec<&str> {
        result.issues.iter().map(|i| i.code.as_str()).collect()
    }

    fn rule(path: &str, content: &str) -> Value {
        json!({"path": path, "response": {"status": 200, "content": content}})
    }

    #[test]
    fn test_valid_config() {
        let result = lint(json!({
            "streaming": {"chunkSize": 10, "chunkIntervalMs": 50},
            "rules": [
                {"path": "/v1/chat/completions", "match": "@", "response": {"status": 200,
                 "content": "{\"model\": \"{{jmes request body.model}}\", \"ts\": {{timestamp}}, \"m\": {{jmes request body.messages[0]}}}"}},
                {"path": "/v1/chat/completions", "match": "contains(body.messages[-1].content, 'hello')",
                 "response": {"status": 200, "content": "{}"}}
            ]
        }));
        assert!(result.issues.is_empty(), "{:?}", result.issues);
    }

    #[test]
    fn test_not_a_mapping() {
        assert_eq!(codes(&lint(json!([1, 2]))), vec!["E003"]);
        assert_eq!(codes(&lint(json!({"streaming": {}}))), vec!["E003"]);
        assert_eq!(codes(&lint(json!({"rules": "nope"}))), vec!["E003"]);
    }

    #[test]
    fn test_missing_path_and_response() {
        let result = lint(json!({"rules": [{"match": "@"}]}));
        assert_eq!(codes(&result), vec!["E004", "E004"]);
    }

    #[test]
    fn test_invalid_regex() {
        let result = lint(json!({"rules": [rule("/v1/(chat", "{}")]}));
        assert_eq!(codes(&result), vec!["E005"]);
        assert_eq!(result.issues[0].location.as_deref(), Some("rules[0].path"));
    }

    #[test]
    fn test_invalid_match_expression() {
        let result = lint(json!({"rules": [
            {"path": "/x", "match": "body.[", "response": {"status": 200, "content": "{}"}}
        ]}));
        assert_eq!(codes(&result), vec!["E006"]);
    }

    #[test]
    fn test_invalid_template_expression() {
        let result = lint(json!({"rules": [rule("/x", "{\"a\": \"{{jmes request body.[}}\"}")]}));
        assert!(codes(&result).contains(&"E007"));
    }

    #[test]
    fn test_invalid_status() {
        let result = lint(json!({"rules": [
            {"path": "/x", "response": {"status": 42, "content": "{}"}},
            {"path": "/y", "response": {"status": "ok", "content": "{}"}}
        ]}));
        assert_eq!(codes(&result), vec!["E008", "E008"]);
    }

    #[test]
    fn test_invalid_streaming() {
        let result = lint(json!({
            "streaming": {"chunkSize": 0, "chunkIntervalMs": "fast"},
            "rules": []
        }));
        assert_eq!(codes(&result), vec!["E009", "E009"]);
    }

    #[test]
    fn test_template_not_json() {
        let result = lint(json!({"rules": [rule("/x", "{\"invalid\": {{unclosed}}")]}));
        assert_eq!(codes(&result), vec!["W001"]);

        let options = LintOptions {
            check_template_json: false,
            ..LintOptions::default()
        };
        let mut result = LintResult::new();
        validate_config(
            Path::new("test.yaml"),
            &json!({"rules": [rule("/x", "not json")]}),
            &mut result,
            &options,
        );
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_sequence_gap() {
        let result = lint(json!({"rules": [
            {"path": "/s", "sequence": 0, "match": "@", "response": {"status": 200, "content": "{}"}},
            {"path": "/s", "sequence": 2, "match": "@", "response": {"status": 200, "content": "{}"}}
        ]}));
        assert_eq!(codes(&result), vec!["W002"]);
        assert!(result.issues[0].message.contains("position(s) 1"));
    }

    #[test]
    fn test_unknown_method() {
        let result = lint(json!({"rules": [
            {"path": "/x", "method": "FETCH", "response": {"status": 200, "content": "{}"}}
        ]}));
        assert_eq!(codes(&result), vec!["W003"]);
    }

    #[test]
    fn test_duplicate_sequence_without_match() {
        let result = lint(json!({"rules": [
            {"path": "/s", "sequence": 0, "response": {"status": 200, "content": "{}"}},
            {"path": "/s", "sequence": 0, "response": {"status": 200, "content": "{}"}}
        ]}));
        assert_eq!(codes(&result), vec!["W004"]);
        assert_eq!(result.issues[0].location.as_deref(), Some("rules[1].sequence"));
    }

    #[test]
    fn test_shadowing() {
        let result = lint(json!({"rules": [
            {"path": "/x", "match": "contains(body.msg, 'hi')", "response": {"status": 200, "content": "{}"}},
            {"path": "/x", "method": "GET", "response": {"status": 200, "content": "{}"}},
            {"path": "/x", "method": "POST", "response": {"status": 200, "content": "{}"}}
        ]}));
        let shadowed: Vec<_> = result.with_code("I001").collect();
        assert_eq!(shadowed.len(), 0);

        let result = lint(json!({"rules": [
            {"path": "/x", "match": "contains(body.msg, 'hi')", "response": {"status": 200, "content": "{}"}},
            {"path": "/x", "response": {"status": 200, "content": "{}"}}
        ]}));
        let shadowed: Vec<_> = result.with_code("I001").collect();
        assert_eq!(shadowed.len(), 1);
        assert_eq!(shadowed[0].location.as_deref(), Some("rules[0]"));
        assert!(result.is_valid());
    }
}
