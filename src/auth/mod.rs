//! Authentication subsystem.
//!
//! # Responsibilities
//! - Define the user-store collaborator contract
//! - Resolve login tokens to identity projections
//! - Degrade every authentication failure to anonymous access; authorization
//!   decisions belong to downstream resolvers and directives
//!
//! # Design Decisions
//! - Identity is a projection, not the full user record: only the configured
//!   fields reach the execution context
//! - Token resolution never raises; an invalid, expired, or unresolvable
//!   token yields an empty identity

pub mod store;
pub mod token;

pub use store::{InMemoryUserStore, StoreError, UserRecord, UserStore};
pub use token::{connection_init_context, resolve_user};
