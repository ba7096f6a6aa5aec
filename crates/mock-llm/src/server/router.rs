//! Route dispatch.

use crate::server::handlers::{completions, config, sse, system};
use crate::server::types::{not_found, ResponseBody};
use crate::state::ConfigStore;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use std::sync::Arc;
use tracing::info;

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    store: Arc<ConfigStore>,
) -> Result<Response<ResponseBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("{} {}", method, path);

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") => system::handle_health(),
        (&Method::GET, "/ready") => system::handle_ready(),
        (&Method::GET, "/sse/mock") => sse::handle_mock(req.uri().query()),
        (&Method::GET, "/config") => config::handle_get(req.headers(), &store),
        (&Method::POST, "/config") => config::handle_replace(req, &store).await,
        (&Method::PATCH, "/config") => config::handle_patch(req, &store).await,
        (&Method::DELETE, "/config") => config::handle_reset(req.headers(), &store),
        (_, "/health" | "/ready" | "/sse/mock" | "/config") => not_found(&method, &path),
        _ => completions::handle(req, &store).await,
    };
    Ok(response)
}
