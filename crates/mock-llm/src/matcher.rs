use crate::config::{Config, ConfigError, Rule};
use crate::expression::{self, EvaluationError};
use crate::request::RequestView;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Why no rule could be selected for a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("No matching rule found for path: {0}")]
    NoRuleForPath(String),
    #[error("No matching rule found for request (sequence: {0})")]
    NoRuleForSequence(u64),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

pub struct CompiledRule {
    path: Regex,
    pub rule: Arc<Rule>,
}

impl CompiledRule {
    pub fn compile(index: usize, rule: Rule) -> Result<Self, ConfigError> {
        let path = Regex::new(&rule.path).map_err(|source| ConfigError::InvalidPath {
            index,
            pattern: rule.path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            rule: Arc::new(rule),
        })
    }

    /// Unanchored regex test against the request path.
    pub fn matches_path(&self, path: &str) -> bool {
        self.path.is_match(path)
    }
}

/// A validated configuration with its path regexes compiled.
pub struct CompiledConfig {
    config: Config,
    rules: Vec<CompiledRule>,
}

impl CompiledConfig {
    pub fn compile(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = config
            .rules
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, rule)| CompiledRule::compile(index, rule))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }
}

/// Per-path position in a scripted sequence. Paths are compared exactly.
#[derive(Debug, Default, Clone)]
pub struct SequenceCounters {
    counters: HashMap<String, u64>,
}

impl SequenceCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, path: &str) -> u64 {
        self.counters.get(path).copied().unwrap_or(0)
    }

    fn advance(&mut self, path: &str, from: u64) {
        self.counters.insert(path.to_string(), from + 1);
    }

    pub fn clear(&mut self) {
        self.counters.clear();
    }
}

/// Pick the rule that answers `view`, advancing the path's counter when the
/// winner is sequence-gated.
///
/// Among rules whose path, method, sequence and predicate all match, the last
/// declared wins. The first predicate that fails to evaluate aborts the match.
pub fn select(
    config: &CompiledConfig,
    counters: &mut SequenceCounters,
    view: &RequestView,
) -> Result<Arc<Rule>, MatchError> {
    let path_matches: Vec<&CompiledRule> = config
        .rules()
        .iter()
        .filter(|r| r.matches_path(&view.path))
        .collect();
    if path_matches.is_empty() {
        return Err(MatchError::NoRuleForPath(view.path.clone()));
    }

    let current = counters.current(&view.path);
    let data: Value = view.to_value();

    let mut winner = None;
    for compiled in path_matches
        .into_iter()
        .filter(|r| r.rule.accepts_method(&view.method))
    {
        let rule = &compiled.rule;
        if rule.sequence.is_some_and(|seq| seq != current) {
            continue;
        }
        if expression::matches(&data, rule.match_expression())? {
            winner = Some(Arc::clone(rule));
        }
    }

    let winner = winner.ok_or(MatchError::NoRuleForSequence(current))?;
    if winner.sequence.is_some() {
        counters.advance(&view.path, current);
    }
    Ok(winner)
}
