//! Configuration types for mock-llm.
//!
//! A configuration is an ordered rule list plus streaming cadence:
//!
//! ```yaml
//! streaming:
//!   chunkSize: 10
//!   chunkIntervalMs: 50
//! rules:
//!   - path: /v1/chat/completions
//!     match: "contains(body.messages[-1].content, 'hello')"
//!     response:
//!       status: 200
//!       content: '{"choices": [{"message": {"role": "assistant", "content": "Hi!"}}]}'
//! ```

mod rules;
mod streaming;

use std::path::{Path, PathBuf};

use hyper::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

pub use rules::{ResponseTemplate, Rule};
pub use streaming::StreamingConfig;

/// File name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "mock-llm.yaml";

const DEFAULT_COMPLETION_TEMPLATE: &str = r#"{
  "id": "chatcmpl-{{timestamp}}",
  "object": "chat.completion",
  "model": "{{jmes request body.model}}",
  "choices": [{
    "message": {
      "role": "assistant",
      "content": "{{jmes request body.messages[-1].content}}"
    },
    "finish_reason": "stop"
  }]
}"#;

const DEFAULT_MODELS_TEMPLATE: &str = r#"{
  "object": "list",
  "data": [{
    "id": "gpt-5.2",
    "object": "model",
    "created": 1733097600,
    "owned_by": "mock-llm"
  }]
}"#;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
    #[error("Invalid path regex '{pattern}' in rule {index}: {source}")]
    InvalidPath {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid method '{method}' in rule {index}")]
    InvalidMethod { index: usize, method: String },
    #[error("Invalid response status {status} in rule {index}")]
    InvalidStatus { index: usize, status: u16 },
    #[error("streaming.{0} must be greater than zero")]
    InvalidStreaming(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Default for Config {
    /// Echo completions on `/v1/chat/completions` and a one-model list on `GET /v1/models`.
    fn default() -> Self {
        Self {
            streaming: StreamingConfig::default(),
            rules: vec![
                Rule {
                    path: "/v1/chat/completions".to_string(),
                    method: None,
                    match_expr: Some("@".to_string()),
                    sequence: None,
                    response: ResponseTemplate {
                        status: 200,
                        content: DEFAULT_COMPLETION_TEMPLATE.to_string(),
                    },
                },
                Rule {
                    path: "/v1/models".to_string(),
                    method: Some("GET".to_string()),
                    match_expr: None,
                    sequence: None,
                    response: ResponseTemplate {
                        status: 200,
                        content: DEFAULT_MODELS_TEMPLATE.to_string(),
                    },
                },
            ],
        }
    }
}

impl Config {
    /// `mock-llm.yaml` in the current working directory.
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_default()
            .join(DEFAULT_CONFIG_FILE)
    }

    /// Load a YAML configuration file, layered over the defaults.
    ///
    /// A missing file yields the default configuration. Top-level keys present
    /// in the file replace the default ones wholesale.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let loaded: Value =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let config = match loaded {
            Value::Null => Self::default(),
            Value::Object(_) => Self::default().merged(loaded)?,
            _ => {
                return Err(ConfigError::Parse(
                    "configuration must be a mapping".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML (or JSON, which is valid YAML) document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: Config =
            serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Shallow-merge `update` over this configuration: every top-level key in
    /// `update` replaces the corresponding key here.
    pub fn merged(&self, update: Value) -> Result<Self, ConfigError> {
        let Value::Object(update) = update else {
            return Err(ConfigError::Parse(
                "configuration update must be an object".to_string(),
            ));
        };

        let mut base = serde_json::to_value(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Value::Object(fields) = &mut base {
            for (key, value) in update {
                fields.insert(key, value);
            }
        }

        Self::from_value(base)
    }

    /// Validate configuration.
    ///
    /// Path regexes are checked when the configuration is compiled for
    /// matching, see [`crate::matcher::CompiledConfig::compile`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streaming.chunk_size == 0 {
            return Err(ConfigError::InvalidStreaming("chunkSize"));
        }
        if self.streaming.chunk_interval_ms == 0 {
            return Err(ConfigError::InvalidStreaming("chunkIntervalMs"));
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(method) = &rule.method {
                if Method::from_bytes(method.to_uppercase().as_bytes()).is_err() {
                    return Err(ConfigError::InvalidMethod {
                        index,
                        method: method.clone(),
                    });
                }
            }

            if StatusCode::from_u16(rule.response.status).is_err() {
                return Err(ConfigError::InvalidStatus {
                    index,
                    status: rule.response.status,
                });
            }
        }

        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Log `message` followed by one line per rule.
    pub fn log_summary(&self, message: &str) {
        info!("{}", message);
        for (index, rule) in self.rules.iter().enumerate() {
            info!("  - rule {}, match: {}", index + 1, rule.match_expression());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tracing_test::traced_test;

    fn rule(path: &str) -> Value {
        json!({"path": path, "response": {"status": 200, "content": "{}"}})
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].path, "/v1/chat/completions");
        assert_eq!(config.rules[0].match_expression(), "@");
        assert!(config.rules[0]
            .response
            .content
            .contains("chatcmpl-{{timestamp}}"));
        assert_eq!(config.rules[1].method.as_deref(), Some("GET"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_path() {
        assert!(Config::default_path().ends_with("mock-llm.yaml"));
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_file_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
rules:
  - path: /custom
    match: "contains(body.msg, 'hi')"
    response:
      status: 201
      content: '{{"custom": true}}'
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.streaming, StreamingConfig::default());
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].path, "/custom");
        assert_eq!(config.rules[0].response.status, 201);
        assert_eq!(config.rules[0].response.content, r#"{"custom": true}"#);
    }

    #[test]
    fn test_from_file_keeps_default_rules_when_only_streaming_set() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "streaming:\n  chunkSize: 3\n  chunkIntervalMs: 7").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.streaming.chunk_size, 3);
        assert_eq!(config.rules, Config::default().rules);
    }

    #[test]
    fn test_from_file_empty_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(Config::from_file(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_from_file_invalid_regex_fails_compile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "rules:\n  - path: '/v1/(unclosed'\n    response:\n      status: 200\n      content: '{{}}'"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(matches!(
            crate::matcher::CompiledConfig::compile(config),
            Err(ConfigError::InvalidPath { index: 0, .. })
        ));
    }

    #[test]
    fn test_from_yaml_str() {
        let config = Config::from_yaml_str(
            "rules:\n  - path: /x\n    sequence: 0\n    response:\n      status: 200\n      content: '{}'",
        )
        .unwrap();
        assert_eq!(config.rules[0].sequence, Some(0));
        assert_eq!(config.streaming, StreamingConfig::default());
    }

    #[test]
    fn test_merged_replaces_top_level_keys() {
        let base = Config::default();
        let updated = base.merged(json!({"rules": [rule("/updated")]})).unwrap();
        assert_eq!(updated.rules.len(), 1);
        assert_eq!(updated.rules[0].path, "/updated");
        assert_eq!(updated.streaming, base.streaming);

        let updated = base
            .merged(json!({"streaming": {"chunkSize": 1, "chunkIntervalMs": 1}}))
            .unwrap();
        assert_eq!(updated.rules, base.rules);
        assert_eq!(updated.streaming.chunk_size, 1);
    }

    #[test]
    fn test_merged_rejects_non_object() {
        assert!(Config::default().merged(json!([1, 2])).is_err());
    }

    #[test]
    fn test_validate_streaming() {
        let mut config = Config::default();
        config.streaming.chunk_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStreaming("chunkSize"))
        ));

        let mut config = Config::default();
        config.streaming.chunk_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStreaming("chunkIntervalMs"))
        ));
    }

    #[test]
    fn test_validate_method_and_status() {
        let mut config = Config::default();
        config.rules[1].method = Some("not a method".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMethod { index: 1, .. })
        ));

        let mut config = Config::default();
        config.rules[0].response.status = 42;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStatus {
                index: 0,
                status: 42
            })
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(Config::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    #[traced_test]
    fn test_log_summary() {
        let config: Config = serde_json::from_value(json!({
            "rules": [
                {"path": "/v1/chat/completions", "match": "@", "response": {"status": 200, "content": "{}"}},
                {"path": "/v1/models", "match": "contains(path, 'models')", "response": {"status": 200, "content": "{}"}},
                {"path": "/v1/other", "response": {"status": 200, "content": "{}"}}
            ]
        }))
        .unwrap();

        config.log_summary("Test config loaded");

        assert!(logs_contain("Test config loaded"));
        assert!(logs_contain("- rule 1, match: @"));
        assert!(logs_contain("- rule 2, match: contains(path, 'models')"));
        assert!(logs_contain("- rule 3, match: @"));
    }
}
