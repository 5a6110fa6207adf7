//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single application instance behind a route
//! - Identify the instance by `(app_id, instance_index)`
//! - Track in-flight requests

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A single backend instance.
#[derive(Debug)]
pub struct Endpoint {
    /// Application the instance belongs to.
    pub app_id: String,
    /// Index of the instance within the application.
    pub instance_index: String,
    /// Address requests are forwarded to.
    pub addr: SocketAddr,
    /// Requests currently being forwarded to this endpoint.
    active_requests: AtomicUsize,
}

impl Endpoint {
    pub fn new(app_id: impl Into<String>, instance_index: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            app_id: app_id.into(),
            instance_index: instance_index.into(),
            addr,
            active_requests: AtomicUsize::new(0),
        }
    }

    /// `<app_id>:<instance_index>`, the same shape the instance header uses.
    pub fn instance_id(&self) -> String {
        format!("{}:{}", self.app_id, self.instance_index)
    }

    /// True when this endpoint is the given application instance.
    pub fn is_instance(&self, app_id: &str, instance_index: &str) -> bool {
        self.app_id == app_id && self.instance_index == instance_index
    }

    pub fn active_requests(&self) -> usize {
        self.active_requests.load(Ordering::Relaxed)
    }

    /// Mark a request as in flight until the returned guard drops.
    pub fn acquire(self: &Arc<Self>) -> EndpointGuard {
        self.active_requests.fetch_add(1, Ordering::Relaxed);
        EndpointGuard {
            endpoint: self.clone(),
        }
    }
}

/// A RAII guard that manages the in-flight request count.
#[derive(Debug)]
pub struct EndpointGuard {
    endpoint: Arc<Endpoint>,
}

impl Deref for EndpointGuard {
    type Target = Endpoint;
    fn deref(&self) -> &Self::Target {
        &self.endpoint
    }
}

impl Drop for EndpointGuard {
    fn drop(&mut self) {
        self.endpoint.active_requests.fetch_sub(1, Ordering::Relaxed);
    }
}
