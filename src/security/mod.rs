//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (listed Origin? prepare CORS headers)
//!     → peer.rs (peer equals a configured loopback literal?)
//!     → gate.rs (combine into one decision: forward or reject)
//!     → Pass to upstream, or 403 with the denial message
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing peer address is a rejection
//! - Exact string comparison everywhere, no normalization
//! - Policy is built once and only read afterwards

pub mod gate;
pub mod origin;
pub mod peer;

pub use gate::{AccessGate, GateDecision, GateState, Verdict};
pub use origin::{AllowedOrigins, CorsHeaders};
pub use peer::{render_peer, LocalPeerAddresses};
