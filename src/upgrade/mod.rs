//! Protocol-upgrade routing subsystem.
//!
//! # Data Flow
//! ```text
//! upgrade request (target path)
//!     → router.rs classify (exact GraphQL path / native prefix / reject)
//!     → GraphQL: subscription transport takes over the handshake
//!     → native:  untouched, the host framework's handler owns it
//!     → reject:  socket destroyed (idempotent, no HTTP response)
//! ```
//!
//! # Design Decisions
//! - Exactly one branch executes per upgrade request; the prefix match takes
//!   precedence over the catch-all reject
//! - The native carve-out is integration policy for the host framework, kept
//!   behind this adapter so a different host can replace it wholesale

pub mod router;

pub use router::{RawSocket, SubscriptionTransport, UpgradeRequest, UpgradeRoute, UpgradeRouter};
