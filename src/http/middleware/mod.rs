//! Request interceptors.

pub mod access_gate;

pub use access_gate::{access_gate_middleware, gate_router};
