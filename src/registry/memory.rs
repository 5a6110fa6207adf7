//! In-memory route table.

use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::RouteConfig;
use crate::load_balancer::{Endpoint, RoutePool};
use crate::registry::Registry;
use crate::routing::RouteKey;

type RouteTable = DashMap<String, Arc<RoutePool>>;

/// Concurrent URI → pool table.
#[derive(Debug)]
pub struct InMemoryRegistry {
    table: ArcSwap<RouteTable>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(DashMap::new()),
        }
    }

    /// Create a registry populated from configuration.
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        Self {
            table: ArcSwap::from_pointee(build_table(routes)),
        }
    }

    /// Add an endpoint under `uri`, replacing any endpoint on the same address.
    pub fn register(&self, uri: &str, endpoint: Endpoint) {
        register_into(&self.table.load(), uri, Arc::new(endpoint));
    }

    /// Remove the endpoint on `addr` from `uri`. Returns false if it was not registered.
    pub fn unregister(&self, uri: &str, addr: SocketAddr) -> bool {
        let table = self.table.load();
        let key = normalize(uri);

        let Some(mut entry) = table.get_mut(&key) else {
            return false;
        };
        if !entry.endpoints().iter().any(|e| e.addr == addr) {
            return false;
        }

        let remaining = entry.without_endpoint(addr);
        let now_empty = remaining.is_empty();
        *entry = Arc::new(remaining);
        drop(entry);

        if now_empty {
            table.remove_if(&key, |_, pool| pool.is_empty());
        }
        true
    }

    /// Rebuild the table from configuration and publish it atomically.
    pub fn replace_all(&self, routes: &[RouteConfig]) {
        self.table.store(Arc::new(build_table(routes)));
    }

    /// Number of registered URIs.
    pub fn num_uris(&self) -> usize {
        self.table.load().len()
    }

    /// Number of endpoints across all URIs.
    pub fn num_endpoints(&self) -> usize {
        self.table.load().iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for InMemoryRegistry {
    fn lookup(&self, key: &RouteKey) -> Option<Arc<RoutePool>> {
        let table = self.table.load();
        let mut candidate = normalize(key.as_str());

        loop {
            if let Some(pool) = table.get(&candidate) {
                if !pool.is_empty() {
                    return Some(pool.value().clone());
                }
            }
            let pos = candidate.rfind('/')?;
            candidate.truncate(pos);
        }
    }

    fn lookup_with_instance(
        &self,
        key: &RouteKey,
        app_id: &str,
        instance_index: &str,
    ) -> Option<Arc<RoutePool>> {
        self.lookup(key)
            .and_then(|pool| pool.filter_instance(app_id, instance_index))
    }
}

/// Route URIs compare case-insensitively and ignore trailing slashes.
fn normalize(uri: &str) -> String {
    uri.trim_end_matches('/').to_lowercase()
}

fn register_into(table: &RouteTable, uri: &str, endpoint: Arc<Endpoint>) {
    let key = normalize(uri);
    let mut entry = table
        .entry(key.clone())
        .or_insert_with(|| Arc::new(RoutePool::new(key, Vec::new())));
    let updated = entry.with_endpoint(endpoint);
    *entry = Arc::new(updated);
}

fn build_table(routes: &[RouteConfig]) -> RouteTable {
    let table = DashMap::new();
    for route in routes {
        for endpoint in &route.endpoints {
            match endpoint.address.parse::<SocketAddr>() {
                Ok(addr) => {
                    let endpoint = Endpoint::new(
                        endpoint.app_id.clone(),
                        endpoint.instance_index.to_string(),
                        addr,
                    );
                    register_into(&table, &route.uri, Arc::new(endpoint));
                }
                Err(_) => {
                    tracing::warn!(uri = %route.uri, address = %endpoint.address, "Invalid endpoint address, skipping");
                }
            }
        }
    }
    table
}
