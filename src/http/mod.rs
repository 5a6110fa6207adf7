//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → access_log.rs (attach AccessLogRecord, log on completion)
//!     → [routing::lookup resolves the route pool]
//!     → proxy.rs (pick endpoint, forward upstream)
//!     → response.rs (status responses written by the proxy itself)
//!     → Send to client
//! ```

pub mod access_log;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use access_log::AccessLogRecord;
pub use request::{request_id, X_REQUEST_ID};
pub use server::HttpServer;
