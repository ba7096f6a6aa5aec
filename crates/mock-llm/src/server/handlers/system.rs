//! System handlers: health and readiness.

use crate::server::types::{json_response, ResponseBody};
use hyper::{Response, StatusCode};

/// GET /health - Health check
pub fn handle_health() -> Response<ResponseBody> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "healthy"}))
}

/// GET /ready - Readiness check
pub fn handle_ready() -> Response<ResponseBody> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ready"}))
}
