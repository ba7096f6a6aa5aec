//! Rule-governed routes.

use crate::engine::{self, Outcome};
use crate::error::MockError;
use crate::request::{parse_body, RequestView};
use crate::server::types::*;
use crate::state::ConfigStore;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use tracing::warn;

fn wire_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Answer any request that is not a fixed route from the rule set.
pub async fn handle(req: Request<Incoming>, store: &ConfigStore) -> Response<ResponseBody> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let headers = req.headers().clone();

    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&MockError::Syntax(e)),
    };
    let body = match parse_body(&body) {
        Ok(v) => v,
        Err(e) => {
            let err = MockError::Syntax(e.to_string());
            warn!("{} {}: {}", method, path, err);
            return error_response(&err);
        }
    };

    let view = RequestView::new(&method, &path, query.as_deref(), &headers, body);
    match engine::handle(store, &view) {
        Ok(Outcome::Json { status, body }) => json_response(wire_status(status), &body),
        Ok(Outcome::Stream(plan)) => {
            sse_response(wire_status(plan.status()), plan.into_stream())
        }
        Err(e) => {
            warn!("{} {}: {}", method, path, e);
            error_response(&e)
        }
    }
}
