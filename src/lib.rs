//! Route lookup stage for a reverse proxy.
//!
//! Maps an inbound request (host, path, optional `X-CF-APP-INSTANCE`) to the
//! pool of endpoints registered for it, or rejects it with a 404.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod registry;
pub mod routing;

pub use config::LookupConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::{InMemoryRegistry, Registry};
pub use routing::{LookupError, LookupHandler, Resolution, RouteKey};
