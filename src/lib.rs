//! GraphQL gateway: endpoint, subscription transport, and context wiring.
//!
//! A thin coordination layer that mounts a GraphQL endpoint into an existing
//! HTTP stack: per-operation context assembly, login-token resolution,
//! protocol-upgrade routing, and the host-framework workarounds that keep
//! the endpoint and the subscription transport from fighting over responses.
//! GraphQL execution itself is delegated to an injected executor.

// Core subsystems
pub mod config;
pub mod context;
pub mod http;
pub mod upgrade;

// Collaborator seams
pub mod auth;
pub mod schema;

// Cross-cutting concerns
pub mod observability;

pub use config::GatewayConfig;
pub use context::{ContextBuilder, ExecutionContext};
pub use http::{GatewayOptions, GatewayServer};
