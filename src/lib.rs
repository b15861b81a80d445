//! Localhost-only access gate for a configuration service.
//!
//! Every request first has its `Origin` checked against an allow-list
//! (listed origins get reflected CORS headers), then its peer address
//! compared with the configured loopback literals. Local peers are forwarded
//! to the configuration service; everyone else gets a 403.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GateConfig;
pub use http::GateServer;
pub use lifecycle::Shutdown;
pub use security::AccessGate;
