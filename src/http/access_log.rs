//! Access logging.
//!
//! # Responsibilities
//! - Attach an `AccessLogRecord` to every request before routing
//! - Let later stages record the status they produced
//! - Emit one structured event and one metric per completed request

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::request::request_id;
use crate::observability::metrics;
use crate::routing::key::request_host;

/// Per-request access log entry shared across pipeline stages.
#[derive(Debug, Clone)]
pub struct AccessLogRecord {
    inner: Arc<RecordInner>,
}

#[derive(Debug)]
struct RecordInner {
    request_id: String,
    method: Method,
    host: String,
    path: String,
    started_at: Instant,
    // 0 until a stage records a status.
    status: AtomicU16,
}

impl AccessLogRecord {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            inner: Arc::new(RecordInner {
                request_id: request_id(req).to_string(),
                method: req.method().clone(),
                host: request_host(req).to_string(),
                path: req.uri().path().to_string(),
                started_at: Instant::now(),
                status: AtomicU16::new(0),
            }),
        }
    }

    pub fn set_status(&self, status: StatusCode) {
        self.inner.status.store(status.as_u16(), Ordering::Relaxed);
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self.inner.status.load(Ordering::Relaxed) {
            0 => None,
            code => StatusCode::from_u16(code).ok(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.inner.request_id
    }

    pub fn started_at(&self) -> Instant {
        self.inner.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}

/// Attach a record, run the rest of the pipeline, then log the outcome.
pub async fn access_log_middleware(mut req: Request<Body>, next: Next) -> Response {
    let record = AccessLogRecord::from_request(&req);
    req.extensions_mut().insert(record.clone());

    let response = next.run(req).await;

    let status = record.status().unwrap_or_else(|| response.status());
    record.set_status(status);
    metrics::record_request(status.as_u16(), record.started_at());

    tracing::info!(
        request_id = %record.request_id(),
        method = %record.inner.method,
        host = %record.inner.host,
        path = %record.inner.path,
        status = status.as_u16(),
        duration_ms = record.elapsed().as_millis() as u64,
        "access"
    );

    response
}
