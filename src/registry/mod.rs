//! Route registry.
//!
//! # Data Flow
//! ```text
//! RouteConfig[] (startup or hot reload)
//!     → memory.rs (build URI → RoutePool table)
//!     → atomic swap of the table
//!
//! Lookup stage:
//!     RouteKey → lookup / lookup_with_instance → Option<Arc<RoutePool>>
//! ```
//!
//! # Design Decisions
//! - Readers never block writers: the table lives behind `ArcSwap`
//! - Pools are copy-on-write; a published `Arc<RoutePool>` never changes
//! - Longest path-prefix match, so `host/v2` serves `host/v2/info`

use std::sync::Arc;

use crate::load_balancer::RoutePool;
use crate::routing::RouteKey;

pub mod memory;

pub use memory::InMemoryRegistry;

/// Read side of the route table, as used by the lookup stage.
pub trait Registry: Send + Sync {
    /// Find the pool serving `key`.
    fn lookup(&self, key: &RouteKey) -> Option<Arc<RoutePool>>;

    /// Find the pool serving `key`, narrowed to one application instance.
    fn lookup_with_instance(
        &self,
        key: &RouteKey,
        app_id: &str,
        instance_index: &str,
    ) -> Option<Arc<RoutePool>>;
}
