//! Server-sent-event rendering of chat completions.
//!
//! A rendered (non-streaming) completion is decomposed into
//! `chat.completion.chunk` frames:
//!
//! ```text
//! data: {"id":"chatcmpl-1","object":"chat.completion.chunk",...,"choices":[{"index":0,"delta":{"role":"assistant","content":"Hello, wor"},"finish_reason":null}]}
//!
//! data: {"id":"chatcmpl-1","object":"chat.completion.chunk",...,"choices":[{"index":0,"delta":{"content":"ld!"},"finish_reason":"stop"}]}
//!
//! data: [DONE]
//! ```
//!
//! Error responses are sent as a single frame with no `[DONE]` sentinel.

use crate::config::StreamingConfig;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Payload of the final frame of a successful stream.
pub const DONE: &str = "[DONE]";

pub const DEFAULT_ID: &str = "chatcmpl-mock";
pub const DEFAULT_MODEL: &str = "mock-model";

/// What a streamed response will emit.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPlan {
    /// One frame carrying the error body verbatim, then close.
    Error(Value),
    /// Completion chunks, paced by `interval`, followed by `[DONE]`.
    Chunks {
        status: u16,
        frames: Vec<Value>,
        interval: Duration,
    },
}

impl StreamPlan {
    /// Plan the stream for a rendered response.
    pub fn new(body: &Value, status: u16, config: &StreamingConfig) -> Self {
        if status >= 400 || body.get("error").is_some() {
            return StreamPlan::Error(body.clone());
        }
        StreamPlan::Chunks {
            status,
            frames: chunk_frames(body, config.chunk_size),
            interval: config.chunk_interval(),
        }
    }

    /// Status line of the event-stream response. Error frames always go out
    /// under 200 so clients read them as stream content.
    pub fn status(&self) -> u16 {
        match self {
            StreamPlan::Error(_) => 200,
            StreamPlan::Chunks { status, .. } => *status,
        }
    }

    /// Every SSE payload in emission order.
    pub fn payloads(&self) -> Vec<String> {
        match self {
            StreamPlan::Error(body) => vec![body.to_string()],
            StreamPlan::Chunks { frames, .. } => frames
                .iter()
                .map(Value::to_string)
                .chain(std::iter::once(DONE.to_string()))
                .collect(),
        }
    }

    /// The encoded event stream. Chunks and the closing `[DONE]` are released
    /// one per tick; dropping the stream drops its timer.
    pub fn into_stream(self) -> BoxStream<'static, Bytes> {
        match self {
            StreamPlan::Error(body) => {
                stream::once(async move { sse_frame(&body.to_string()) }).boxed()
            }
            StreamPlan::Chunks {
                frames, interval, ..
            } => {
                let frames: Vec<Bytes> = frames
                    .iter()
                    .map(|f| sse_frame(&f.to_string()))
                    .chain(std::iter::once(sse_frame(DONE)))
                    .collect();
                paced(frames, interval)
            }
        }
    }
}

/// Encode one SSE event.
pub fn sse_frame(payload: &str) -> Bytes {
    Bytes::from(format!("data: {}\n\n", payload))
}

/// Yield `frames` one per `period`, the first after one full period.
pub fn paced(frames: Vec<Bytes>, period: Duration) -> BoxStream<'static, Bytes> {
    let state: (std::vec::IntoIter<Bytes>, Option<Interval>) = (frames.into_iter(), None);
    stream::unfold(state, move |(mut frames, timer)| async move {
        let frame = frames.next()?;
        let mut timer = timer.unwrap_or_else(|| {
            let mut timer = tokio::time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        });
        timer.tick().await;
        Some((frame, (frames, Some(timer))))
    })
    .boxed()
}

/// Split `content` into pieces of at most `size` characters.
///
/// Empty content yields a single empty piece.
pub fn split_into_chunks(content: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Build the chunk objects for a rendered completion body.
pub fn chunk_frames(body: &Value, chunk_size: usize) -> Vec<Value> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or("");
    let id = body.get("id").cloned().unwrap_or_else(|| json!(DEFAULT_ID));
    let model = body
        .get("model")
        .cloned()
        .unwrap_or_else(|| json!(DEFAULT_MODEL));
    let created = body
        .get("created")
        .cloned()
        .unwrap_or_else(|| json!(chrono::Utc::now().timestamp()));

    let pieces = split_into_chunks(content, chunk_size);
    let last = pieces.len() - 1;
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let mut delta = Map::new();
            if i == 0 {
                delta.insert("role".to_string(), json!("assistant"));
            }
            if !piece.is_empty() {
                delta.insert("content".to_string(), Value::String(piece));
            }
            let finish_reason = if i == last { json!("stop") } else { Value::Null };
            json!({
                "id": id,
                "object": "chat.completion.chunk",
                "created": created,
                "model": model,
                "choices": [{
                    "index": 0,
                    "delta": delta,
                    "finish_reason": finish_reason,
                }],
            })
        })
        .collect()
}
