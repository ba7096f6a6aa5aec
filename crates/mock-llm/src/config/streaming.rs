//! Streaming cadence configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How rendered completions are fragmented into SSE chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingConfig {
    /// Maximum characters of content per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Delay between consecutive chunks
    #[serde(default = "default_chunk_interval_ms")]
    pub chunk_interval_ms: u64,
}

fn default_chunk_size() -> usize {
    10
}

fn default_chunk_interval_ms() -> u64 {
    50
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_interval_ms: default_chunk_interval_ms(),
        }
    }
}

impl StreamingConfig {
    pub fn chunk_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_interval_ms)
    }
}
