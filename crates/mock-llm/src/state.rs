//! In-memory configuration store shared by all request handlers.

use crate::config::{Config, ConfigError, Rule, StreamingConfig};
use crate::matcher::{self, CompiledConfig, MatchError, SequenceCounters};
use crate::request::RequestView;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Holds the startup configuration, the current configuration and the
/// per-path sequence counters.
pub struct ConfigStore {
    initial: Arc<CompiledConfig>,
    current: RwLock<Arc<CompiledConfig>>,
    counters: Mutex<SequenceCounters>,
}

impl ConfigStore {
    pub fn new(initial: Config) -> Result<Self, ConfigError> {
        let initial = Arc::new(CompiledConfig::compile(initial)?);
        Ok(Self {
            current: RwLock::new(Arc::clone(&initial)),
            initial,
            counters: Mutex::new(SequenceCounters::new()),
        })
    }

    pub fn current(&self) -> Config {
        self.current.read().config().clone()
    }

    pub fn streaming(&self) -> StreamingConfig {
        self.current.read().config().streaming
    }

    /// Replace the current configuration wholesale.
    ///
    /// On validation failure the current configuration is left untouched.
    pub fn replace(&self, config: Config) -> Result<Config, ConfigError> {
        let compiled = CompiledConfig::compile(config)?;
        let config = compiled.config().clone();
        *self.current.write() = Arc::new(compiled);
        debug!("Configuration replaced ({} rules)", config.rules.len());
        Ok(config)
    }

    /// Shallow-merge `update` into the current configuration.
    pub fn patch(&self, update: Value) -> Result<Config, ConfigError> {
        let mut current = self.current.write();
        let merged = current.config().merged(update)?;
        let compiled = CompiledConfig::compile(merged)?;
        let config = compiled.config().clone();
        *current = Arc::new(compiled);
        debug!("Configuration patched ({} rules)", config.rules.len());
        Ok(config)
    }

    /// Restore the startup configuration and zero every sequence counter.
    pub fn reset(&self) -> Config {
        let mut counters = self.counters.lock();
        *self.current.write() = Arc::clone(&self.initial);
        counters.clear();
        debug!("Configuration reset");
        self.initial.config().clone()
    }

    /// Select the rule for `view`. The counter read and advance happen under
    /// one lock acquisition.
    pub fn select(&self, view: &RequestView) -> Result<Arc<Rule>, MatchError> {
        let config = Arc::clone(&self.current.read());
        let mut counters = self.counters.lock();
        matcher::select(&config, &mut counters, view)
    }
}
