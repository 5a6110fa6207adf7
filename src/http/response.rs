//! Responses generated by the proxy itself.
//!
//! # Responsibilities
//! - Write status responses with a plain-text body
//! - Record the status on the access log record when one is attached
//! - Mark route lookup failures with `X-Cf-RouterError`

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::access_log::AccessLogRecord;

/// Response header naming the class of a proxy-side failure.
pub const X_CF_ROUTER_ERROR: HeaderName = HeaderName::from_static("x-cf-routererror");

/// Write a status response, updating the access log record if present.
pub fn write_status(
    status: StatusCode,
    body: impl Into<String>,
    record: Option<&AccessLogRecord>,
) -> Response {
    if let Some(record) = record {
        record.set_status(status);
    }
    (status, body.into()).into_response()
}

/// 404 for a request whose route could not be resolved.
///
/// The body names the host only, never the path.
pub fn unknown_route(host: &str, record: Option<&AccessLogRecord>) -> Response {
    let mut response = write_status(
        StatusCode::NOT_FOUND,
        format!("Requested route ('{}') does not exist.", host),
        record,
    );
    response
        .headers_mut()
        .insert(X_CF_ROUTER_ERROR, HeaderValue::from_static("unknown_route"));
    response
}
