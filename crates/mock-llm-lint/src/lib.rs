//! Configuration linting library for mock-llm.
//!
//! Checks rule files before they are loaded into the server: path regexes,
//! JMESPath predicates and template directives, status codes, streaming
//! settings, and rule-ordering mistakes such as sequence gaps or catch-all
//! rules that hide earlier ones.
//!
//! # Example
//!
//! ```no_run
//! use mock_llm_lint::{lint_file, LintOptions};
//! use std::path::Path;
//!
//! let result = lint_file(Path::new("mock-llm.yaml"), &LintOptions::default());
//! if result.has_errors() {
//!     eprintln!("Found {} errors", result.errors);
//! }
//! ```

mod types;
mod validator;

use serde_json::Value;
use std::path::{Path, PathBuf};

pub use types::{LintIssue, LintOptions, LintResult, Severity};

pub use validator::{
    validate_config, validate_response, validate_rule, validate_streaming, validate_template,
};

/// File extensions picked up when linting a directory.
pub const CONFIG_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CONFIG_EXTENSIONS.contains(&e))
}

/// Parse a document as JSON when the name says so, otherwise as YAML.
fn parse_document(text: &str, path: &Path) -> Result<Value, String> {
    if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {e}"))
    } else {
        serde_yaml::from_str(text).map_err(|e| format!("Invalid YAML: {e}"))
    }
}

/// Lint a single configuration file.
pub fn lint_file(path: &Path, options: &LintOptions) -> LintResult {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            let mut result = LintResult::new();
            result.files_checked = 1;
            result.add_issue(LintIssue::error(
                "E001",
                format!("Failed to read file: {e}"),
                path,
            ));
            return result;
        }
    };
    lint_str(&content, path, options)
}

/// Lint every configuration file in a directory (non-recursive).
pub fn lint_directory(path: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    for file in collect_config_files(path) {
        result.merge(lint_file(&file, options));
    }
    result
}

/// Configuration files under `path`: the file itself, or the config files
/// directly inside a directory, sorted.
pub fn collect_config_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if path.is_file() {
        files.push(path.to_path_buf());
    } else if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_file() && is_config_file(&entry_path) {
                files.push(entry_path);
            }
        }
    }

    files.sort();
    files
}

/// Lint an in-memory document. `source` names it in reported issues and
/// selects the parser (`.json` is parsed as JSON, anything else as YAML).
pub fn lint_str(text: &str, source: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;

    match parse_document(text, source) {
        Ok(value) => validate_config(source, &value, &mut result, options),
        Err(message) => result.add_issue(
            LintIssue::error("E002", message, source)
                .with_suggestion("Check for indentation or quoting mistakes"),
        ),
    }
    result
}

/// Lint an already-parsed document.
pub fn lint_value(value: &Value, source: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;
    validate_config(source, value, &mut result, options);
    result
}
