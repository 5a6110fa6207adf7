//! Route pool.
//!
//! # Responsibilities
//! - Hold the endpoints registered under one route URI
//! - Apply the load balancing algorithm to pick an endpoint
//! - Build narrowed or updated copies for the registry

use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;

use crate::load_balancer::{
    endpoint::{Endpoint, EndpointGuard},
    round_robin::RoundRobin,
};

/// Endpoints serving a route URI.
#[derive(Debug)]
pub struct RoutePool {
    uri: String,
    endpoints: Vec<Arc<Endpoint>>,
    balancer: RoundRobin,
    /// Narrowed pools keyed by `<app_id>:<instance_index>`, built on first use.
    instances: DashMap<String, Arc<RoutePool>>,
}

impl RoutePool {
    /// Create a round-robin pool.
    pub fn new(uri: impl Into<String>, endpoints: Vec<Arc<Endpoint>>) -> Self {
        Self {
            uri: uri.into(),
            endpoints,
            balancer: RoundRobin::new(),
            instances: DashMap::new(),
        }
    }

    /// The URI this pool was registered under.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Select the next endpoint and mark a request in flight on it.
    pub fn next_endpoint(&self) -> Option<EndpointGuard> {
        self.balancer
            .next_endpoint(&self.endpoints)
            .map(|endpoint| endpoint.acquire())
    }

    /// A pool holding only the given application instance, if registered here.
    ///
    /// Repeated calls return the same pool, so endpoints sharing one instance
    /// identity keep rotating across requests.
    pub fn filter_instance(&self, app_id: &str, instance_index: &str) -> Option<Arc<RoutePool>> {
        let id = format!("{app_id}:{instance_index}");
        if let Some(pool) = self.instances.get(&id) {
            return Some(pool.value().clone());
        }

        let endpoints: Vec<_> = self
            .endpoints
            .iter()
            .filter(|e| e.is_instance(app_id, instance_index))
            .cloned()
            .collect();

        if endpoints.is_empty() {
            return None;
        }
        let narrowed = Arc::new(RoutePool::new(self.uri.clone(), endpoints));
        Some(self.instances.entry(id).or_insert(narrowed).value().clone())
    }

    /// Copy of this pool with `endpoint` added, replacing any endpoint on the same address.
    pub(crate) fn with_endpoint(&self, endpoint: Arc<Endpoint>) -> RoutePool {
        let mut endpoints: Vec<_> = self
            .endpoints
            .iter()
            .filter(|e| e.addr != endpoint.addr)
            .cloned()
            .collect();
        endpoints.push(endpoint);
        RoutePool::new(self.uri.clone(), endpoints)
    }

    /// Copy of this pool without the endpoint on `addr`.
    pub(crate) fn without_endpoint(&self, addr: SocketAddr) -> RoutePool {
        let endpoints = self
            .endpoints
            .iter()
            .filter(|e| e.addr != addr)
            .cloned()
            .collect();
        RoutePool::new(self.uri.clone(), endpoints)
    }
}
