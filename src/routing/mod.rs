//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, X-CF-APP-INSTANCE)
//!     → key.rs (host without port + escaped path)
//!     → instance.rs (parse optional instance selector)
//!     → lookup.rs (registry lookup, scoped or unscoped)
//!     → Return: Resolved(pool) or Rejected(reason)
//! ```
//!
//! # Design Decisions
//! - Deterministic: same request and registry snapshot give the same outcome
//! - Rejections are values, never panics; each is scoped to one request
//! - The resolved pool travels in request extensions, not global state

pub mod error;
pub mod instance;
pub mod key;
pub mod lookup;

pub use error::LookupError;
pub use instance::{InstanceHeaderError, InstanceSelector, CF_APP_INSTANCE, CF_INSTANCE_ID};
pub use key::RouteKey;
pub use lookup::{lookup_middleware, LookupHandler, Resolution};
