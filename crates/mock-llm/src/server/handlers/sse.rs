//! GET /sse/mock - a scripted event stream for exercising SSE clients.
//!
//! Query parameters:
//! - `count` - number of data frames (default 5)
//! - `intervalMs` - delay between frames (default 50)
//! - `prefix` - text prefix of each frame's `data` field (default `chunk`)
//! - `errorAfter` - index at which an error frame replaces the data and the
//!   stream ends without `[DONE]` (default -1, never)

use crate::request::parse_query_string;
use crate::server::types::{sse_response, ResponseBody};
use crate::streaming::{paced, sse_frame, DONE};
use hyper::{Response, StatusCode};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSseParams {
    pub count: u64,
    pub interval_ms: u64,
    pub prefix: String,
    pub error_after: Option<u64>,
}

impl Default for MockSseParams {
    fn default() -> Self {
        Self {
            count: 5,
            interval_ms: 50,
            prefix: "chunk".to_string(),
            error_after: None,
        }
    }
}

impl MockSseParams {
    /// Parse query parameters; unparseable values fall back to the defaults.
    pub fn parse(query: Option<&str>) -> Self {
        let params: BTreeMap<String, String> = parse_query_string(query);
        let defaults = Self::default();

        let count = params
            .get("count")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.count)
            .max(1);
        let interval_ms = params
            .get("intervalMs")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.interval_ms)
            .max(1);
        let prefix = params
            .get("prefix")
            .filter(|p| !p.is_empty())
            .cloned()
            .unwrap_or(defaults.prefix);
        let error_after = params
            .get("errorAfter")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|n| u64::try_from(n).ok());

        Self {
            count,
            interval_ms,
            prefix,
            error_after,
        }
    }

    /// Payloads in emission order.
    pub fn payloads(&self) -> Vec<String> {
        let mut payloads = Vec::new();
        for index in 0..=self.count {
            if self.error_after == Some(index) {
                payloads.push(
                    json!({"error": "MockError", "message": "Injected error", "status": 500})
                        .to_string(),
                );
                return payloads;
            }
            if index < self.count {
                payloads.push(
                    json!({"index": index, "data": format!("{}-{}", self.prefix, index)})
                        .to_string(),
                );
            }
        }
        payloads.push(DONE.to_string());
        payloads
    }
}

pub fn handle_mock(query: Option<&str>) -> Response<ResponseBody> {
    let params = MockSseParams::parse(query);
    let frames = params.payloads().iter().map(|p| sse_frame(p)).collect();
    sse_response(
        StatusCode::OK,
        paced(frames, Duration::from_millis(params.interval_ms)),
    )
}
