//! Live configuration handlers.

use crate::config::{Config, ConfigError};
use crate::error::MockError;
use crate::request::parse_body;
use crate::server::types::*;
use crate::state::ConfigStore;
use hyper::body::Incoming;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{HeaderMap, Request, Response, StatusCode};
use serde_json::Value;
use tracing::{info, warn};

fn wants_yaml(value: Option<&hyper::header::HeaderValue>) -> bool {
    value
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("yaml"))
}

fn config_response(headers: &HeaderMap, config: &Config) -> Response<ResponseBody> {
    if wants_yaml(headers.get(ACCEPT)) {
        return match config.to_yaml() {
            Ok(yaml) => build_response_with_headers(
                StatusCode::OK,
                [("Content-Type", "application/x-yaml")],
                full(yaml),
            ),
            Err(e) => error_response(&MockError::from(e)),
        };
    }
    json_response(StatusCode::OK, config)
}

fn rejected(err: MockError) -> Response<ResponseBody> {
    warn!("Configuration update rejected: {}", err);
    error_response(&err)
}

/// Read the request body as a JSON value, or as YAML when the
/// `Content-Type` says so.
async fn read_document(req: Request<Incoming>) -> Result<Value, MockError> {
    let yaml = wants_yaml(req.headers().get(CONTENT_TYPE));
    let body = collect_body(req).await.map_err(MockError::Syntax)?;
    if yaml {
        let text = String::from_utf8_lossy(&body);
        return serde_yaml::from_str(&text)
            .map_err(|e| MockError::InvalidConfig(ConfigError::Parse(e.to_string())));
    }
    parse_body(&body).map_err(|e| MockError::Syntax(e.to_string()))
}

/// GET /config
pub fn handle_get(headers: &HeaderMap, store: &ConfigStore) -> Response<ResponseBody> {
    config_response(headers, &store.current())
}

/// POST /config - replace the whole configuration
pub async fn handle_replace(req: Request<Incoming>, store: &ConfigStore) -> Response<ResponseBody> {
    let headers = req.headers().clone();
    let document = match read_document(req).await {
        Ok(d) => d,
        Err(e) => return rejected(e),
    };

    match Config::from_value(document).and_then(|c| store.replace(c)) {
        Ok(config) => {
            config.log_summary("Configuration replaced");
            config_response(&headers, &config)
        }
        Err(e) => rejected(e.into()),
    }
}

/// PATCH /config - shallow merge into the current configuration
pub async fn handle_patch(req: Request<Incoming>, store: &ConfigStore) -> Response<ResponseBody> {
    let headers = req.headers().clone();
    let update = match read_document(req).await {
        Ok(d) => d,
        Err(e) => return rejected(e),
    };

    match store.patch(update) {
        Ok(config) => {
            config.log_summary("Configuration updated");
            config_response(&headers, &config)
        }
        Err(e) => rejected(e.into()),
    }
}

/// DELETE /config - restore startup configuration and sequence counters
pub fn handle_reset(headers: &HeaderMap, store: &ConfigStore) -> Response<ResponseBody> {
    let config = store.reset();
    info!("Configuration reset to startup values");
    config_response(headers, &config)
}
