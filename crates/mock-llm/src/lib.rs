//! mock-llm: a rule-driven mock of an OpenAI-style chat-completion API.
//!
//! Incoming requests are matched against an ordered rule list (path regex,
//! method, per-path sequence position and a JMESPath predicate), the winning
//! rule's template is rendered against the request, and the result is sent
//! either as JSON or as a stream of `chat.completion.chunk` events.

pub mod config;
pub mod engine;
pub mod error;
pub mod expression;
pub mod matcher;
pub mod request;
pub mod server;
pub mod state;
pub mod streaming;
pub mod template;

pub use config::Config;
pub use error::MockError;
pub use server::{serve, MockLlmServer};
pub use state::ConfigStore;
