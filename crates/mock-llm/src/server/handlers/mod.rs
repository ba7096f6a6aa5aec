pub mod completions;
pub mod config;
pub mod sse;
pub mod system;
