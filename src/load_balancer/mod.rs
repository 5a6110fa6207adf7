//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route resolved → Arc<RoutePool> in request extensions
//!     → pool.rs (endpoints registered for the route)
//!     → round_robin.rs (rotate through endpoints)
//!     → endpoint.rs (guard tracks in-flight requests)
//!     → Forwarding stage sends the request upstream
//! ```
//!
//! # Design Decisions
//! - Pools are immutable once published; the registry swaps in new ones on change
//! - The lookup stage treats a pool as opaque and only checks it is non-empty
//! - Narrowed per-instance pools are cached on their parent so rotation state survives

pub mod endpoint;
pub mod pool;
pub mod round_robin;

pub use endpoint::{Endpoint, EndpointGuard};
pub use pool::RoutePool;
pub use round_robin::RoundRobin;
