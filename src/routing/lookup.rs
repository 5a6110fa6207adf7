//! Route lookup stage.
//!
//! # Responsibilities
//! - Build the route key for the request
//! - Narrow the lookup to one instance when `X-CF-APP-INSTANCE` is set
//! - Attach the resolved pool to the request extensions, or reject with a 404
//!
//! # Design Decisions
//! - A malformed instance header is never retried as an unscoped lookup
//! - Resolution only reads the registry; it holds no state of its own
//! - Rejection side effects (metric, log, response) happen once, in one place

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::access_log::AccessLogRecord;
use crate::http::response;
use crate::load_balancer::RoutePool;
use crate::observability::metrics::MetricsReporter;
use crate::registry::Registry;
use crate::routing::error::LookupError;
use crate::routing::instance::InstanceSelector;
use crate::routing::key::{request_host, RouteKey};

/// Outcome of resolving one request.
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(Arc<RoutePool>),
    Rejected(LookupError),
}

/// Resolves requests against a registry and reports rejections.
pub struct LookupHandler {
    registry: Arc<dyn Registry>,
    reporter: Arc<dyn MetricsReporter>,
}

impl LookupHandler {
    pub fn new(registry: Arc<dyn Registry>, reporter: Arc<dyn MetricsReporter>) -> Self {
        Self { registry, reporter }
    }

    /// Map a request to a route pool.
    pub fn resolve<B>(&self, req: &Request<B>) -> Resolution {
        let key = RouteKey::from_request(req);

        let selector = match InstanceSelector::from_headers(req.headers()) {
            Ok(selector) => selector,
            Err(e) => return Resolution::Rejected(e.into()),
        };

        let pool = match selector {
            Some(s) => self
                .registry
                .lookup_with_instance(&key, &s.app_id, &s.instance_index),
            None => self.registry.lookup(&key),
        };

        match pool {
            Some(pool) if !pool.is_empty() => Resolution::Resolved(pool),
            _ => Resolution::Rejected(LookupError::UnknownRoute { key }),
        }
    }

    /// Report a rejection and build the client response.
    pub fn reject<B>(&self, req: &Request<B>, error: &LookupError) -> Response {
        self.reporter.capture_bad_request();

        match error {
            LookupError::InvalidInstanceHeader(e) => {
                tracing::error!(header = %e.value(), error = %e, "invalid-app-instance-header");
            }
            LookupError::UnknownRoute { key } => {
                tracing::info!(route = %key, "unknown-route");
            }
        }

        response::unknown_route(
            request_host(req),
            req.extensions().get::<AccessLogRecord>(),
        )
    }
}

/// Middleware wrapping [`LookupHandler`].
///
/// On success the `Arc<RoutePool>` is inserted into the request extensions for
/// later stages; on rejection the pipeline stops here.
pub async fn lookup_middleware(
    State(handler): State<Arc<LookupHandler>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match handler.resolve(&req) {
        Resolution::Resolved(pool) => {
            tracing::debug!(route = %pool.uri(), endpoints = pool.len(), "route resolved");
            req.extensions_mut().insert(pool);
            next.run(req).await
        }
        Resolution::Rejected(error) => handler.reject(&req, &error),
    }
}
