//! HTTP surface for mock-llm.
//!
//! Fixed routes:
//! - `GET /health`, `GET /ready` - liveness and readiness
//! - `GET|POST|PATCH|DELETE /config` - inspect and mutate the live configuration
//! - `GET /sse/mock` - a generic scripted event stream
//!
//! Every other request is answered by the rule engine.

mod handlers;
mod listener;
mod router;
mod types;

pub use listener::{serve, MockLlmServer};
pub use types::ResponseBody;
