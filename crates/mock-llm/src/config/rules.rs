//! Rule configuration: what to match and what to respond with.

use serde::{Deserialize, Serialize};

/// One matching/response directive.
///
/// Rules are evaluated in declaration order and the last matching rule wins,
/// so catch-all rules go first and overrides later.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rule {
    /// Regex tested against the URL path (unanchored)
    pub path: String,
    /// HTTP verb, case-insensitive. Absent matches every verb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// JMESPath predicate over the request view. Absent means `@`.
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_expr: Option<String>,
    /// Position in the per-path scripted sequence this rule answers.
    /// Absent means the rule answers at any position and never advances it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    pub response: ResponseTemplate,
}

/// Status code plus the template rendered into the response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseTemplate {
    pub status: u16,
    pub content: String,
}

impl Rule {
    /// The predicate expression, defaulting to the identity expression.
    pub fn match_expression(&self) -> &str {
        self.match_expr
            .as_deref()
            .unwrap_or(crate::expression::MATCH_ALL)
    }

    /// Whether this rule accepts the given (upper- or lower-case) verb.
    pub fn accepts_method(&self, method: &str) -> bool {
        self.method
            .as_deref()
            .map_or(true, |m| m.eq_ignore_ascii_case(method))
    }
}
