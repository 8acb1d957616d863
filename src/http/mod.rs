//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, GraphQL endpoint, WS handshake)
//!     → context builder (per-operation ExecutionContext)
//!     → executor (GraphQL execution, external collaborator)
//!     → schema::sanitize_response (strip internals)
//!     → Send to client
//!
//! GET probes on the GraphQL path → guard.rs (empty 200)
//! ```

pub mod guard;
pub mod server;

pub use server::{GatewayOptions, GatewayServer, MiddlewareFn};
