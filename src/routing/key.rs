//! Route key construction.
//!
//! # Responsibilities
//! - Extract the request host (Host header, then URI authority)
//! - Strip the port from the host
//! - Append the escaped path as received on the wire
//!
//! # Design Decisions
//! - The path is taken verbatim from the request URI, so percent-encoding is preserved
//! - The query string is never part of the key
//! - Normalization (case, trailing slash) is left to the registry

use std::fmt;

use axum::http::{header, Request};

/// Registry lookup key: host without port followed by the escaped path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey(String);

impl RouteKey {
    /// Build a key from a raw host (port allowed) and an escaped path.
    pub fn new(host: &str, escaped_path: &str) -> Self {
        Self(format!("{}{}", host_without_port(host), escaped_path))
    }

    /// Build the key for an inbound request.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self::new(request_host(req), req.uri().path())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The host the client addressed, port included.
///
/// HTTP/1 clients send a Host header; HTTP/2 clients send `:authority`, which
/// surfaces as the URI authority.
pub fn request_host<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or_default()
}

/// Strip a `:port` suffix. Bracketed IPv6 literals keep their brackets.
pub fn host_without_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.find(':') {
        Some(pos) => &host[..pos],
        None => host,
    }
}
