//! Response body type and response helpers.

use crate::error::MockError;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;

/// Body shared by buffered JSON responses and event streams.
pub type ResponseBody = UnsyncBoxBody<Bytes, hyper::Error>;

pub fn full(body: impl Into<Bytes>) -> ResponseBody {
    Full::new(body.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<ResponseBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], full(json))
}

/// Build an HTTP response with headers.
///
/// Falls back to a bare 500 if the builder rejects a header.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder.body(body).unwrap_or_else(|_| {
        let mut response = Response::new(full("Internal Server Error"));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

/// A `text/event-stream` response fed by `events`.
pub fn sse_response(
    status: StatusCode,
    events: BoxStream<'static, Bytes>,
) -> Response<ResponseBody> {
    let body = StreamBody::new(events.map(|bytes| Ok::<_, hyper::Error>(Frame::data(bytes))));
    build_response_with_headers(
        status,
        [
            ("Content-Type", "text/event-stream"),
            ("Cache-Control", "no-cache"),
            ("Connection", "keep-alive"),
        ],
        body.boxed_unsync(),
    )
}

/// Render a [`MockError`] as `{error, message, status}`.
pub fn error_response(err: &MockError) -> Response<ResponseBody> {
    json_response(err.status(), &err.to_body())
}

/// `Cannot <METHOD> <path>`
pub fn not_found(method: &Method, path: &str) -> Response<ResponseBody> {
    error_response(&MockError::NotFound {
        method: method.to_string(),
        path: path.to_string(),
    })
}

/// Collect request body into bytes
pub async fn collect_body(req: Request<Incoming>) -> Result<Bytes, String> {
    req.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}
