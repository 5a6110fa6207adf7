//! Forwarding stage.
//!
//! # Responsibilities
//! - Read the route pool resolved by the lookup stage
//! - Pick an endpoint and forward the request to it
//! - Tag the response with the serving instance
//!
//! # Design Decisions
//! - Single attempt, no retries
//! - A missing pool is a wiring bug, not a client error, so it is a 500

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        HeaderValue, Request, StatusCode, Uri,
    },
    response::Response,
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::http::access_log::AccessLogRecord;
use crate::http::request::request_id;
use crate::http::response::write_status;
use crate::load_balancer::RoutePool;
use crate::routing::CF_INSTANCE_ID;

pub type HttpClient = Client<HttpConnector, Body>;

/// Forward the request to an endpoint of the resolved pool.
pub async fn proxy_handler(State(client): State<HttpClient>, request: Request<Body>) -> Response {
    let record = request.extensions().get::<AccessLogRecord>().cloned();
    let request_id = request_id(&request).to_string();

    let Some(pool) = request.extensions().get::<Arc<RoutePool>>().cloned() else {
        tracing::error!(request_id = %request_id, "Route pool missing from request context");
        return write_status(StatusCode::INTERNAL_SERVER_ERROR, "Route pool missing", record.as_ref());
    };

    let Some(endpoint) = pool.next_endpoint() else {
        tracing::warn!(request_id = %request_id, route = %pool.uri(), "No endpoints available");
        return write_status(StatusCode::SERVICE_UNAVAILABLE, "No endpoints available", record.as_ref());
    };

    let (mut parts, body) = request.into_parts();
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Authority::from_str(&endpoint.addr.to_string()).ok();
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return write_status(StatusCode::BAD_GATEWAY, "Upstream request failed", record.as_ref());
        }
    };

    tracing::debug!(
        request_id = %request_id,
        route = %pool.uri(),
        endpoint = %endpoint.addr,
        instance = %endpoint.instance_id(),
        "Forwarding request"
    );

    match client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            if let Ok(value) = HeaderValue::from_str(&endpoint.instance_id()) {
                parts.headers.insert(CF_INSTANCE_ID, value);
            }
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, endpoint = %endpoint.addr, error = %e, "Upstream error");
            write_status(StatusCode::BAD_GATEWAY, "Upstream request failed", record.as_ref())
        }
    }
}
