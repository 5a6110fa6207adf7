//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limit)
//!     → Hand off to HTTP layer (axum::serve)
//! ```
//!
//! # Design Decisions
//! - A slot is taken before accepting, so a full server leaves new peers in the kernel backlog
//! - The slot travels with the stream and is released when the connection closes

pub mod listener;

pub use listener::{BoundedListener, LimitedStream};
