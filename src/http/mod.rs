//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address attached as ConnectInfo)
//!     → middleware/access_gate.rs (CORS headers, localhost check; may answer 403)
//!     → server.rs layers (request ID, tracing, timeout)
//!     → upstream.rs (forward to the configuration service)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;
pub mod upstream;

pub use middleware::{access_gate_middleware, gate_router};
pub use server::{GateServer, ServerError};
pub use upstream::Upstream;
